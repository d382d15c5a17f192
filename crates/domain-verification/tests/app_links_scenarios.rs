//! # App Links Integration Tests
//!
//! End-to-end device scenarios driven through the public API only:
//!
//! 1. Install, verify, query
//! 2. Upgrade with a changed domain list
//! 3. Reboot: write settings, read them back, re-attach, resend
//! 4. Backup restore onto a fresh device
//! 5. Concurrent callers on a shared service

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use domain_verification::{
    DomainSetId, DomainVerificationApi, DomainVerificationConfig, DomainVerificationDependencies,
    DomainVerificationInternal, DomainVerificationService, InMemoryConnection, LinkFilter,
    ManifestDomainCollector, PackageManifest, PackageSetting, PolicyEnforcer, RecordingProxy,
    VerificationState,
};

const SYSTEM_UID: u32 = 1000;
const AGENT_UID: u32 = 10_050;

type Service =
    DomainVerificationService<InMemoryConnection, ManifestDomainCollector, PolicyEnforcer>;

fn boot(config: DomainVerificationConfig) -> (Service, Arc<RecordingProxy>) {
    let deps = DomainVerificationDependencies {
        connection: InMemoryConnection::new(),
        collector: ManifestDomainCollector::new(),
        enforcer: PolicyEnforcer::from_config(&config),
    };
    let service = DomainVerificationService::new(deps, config);
    let proxy = Arc::new(RecordingProxy::with_verifier(AGENT_UID));
    service.set_proxy(proxy.clone());
    service.connection().set_caller(SYSTEM_UID, 0);
    (service, proxy)
}

fn domains(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|d| d.to_string()).collect()
}

fn package(
    service: &Service,
    name: &str,
    auto_verify: &[&str],
    web_only: &[&str],
) -> PackageSetting {
    let manifest = PackageManifest::new(
        name,
        vec![
            LinkFilter::web(true, auto_verify),
            LinkFilter::web(false, web_only),
        ],
    );
    let setting = PackageSetting::new(name, service.generate_new_id(), manifest);
    service.connection().install(setting.clone());
    setting
}

#[test]
fn test_install_verify_and_query() {
    let (service, proxy) = boot(DomainVerificationConfig::default());
    let app = package(&service, "com.shop", &["shop.com", "www.shop.com"], &["help.com"]);
    service.add_package(&app);

    assert_eq!(proxy.notified_packages(), vec!["com.shop".to_string()]);

    service.connection().set_caller(AGENT_UID, 0);
    assert_eq!(service.list_verified_package_names().unwrap(), vec!["com.shop"]);
    let modified = service
        .set_verification_state(
            app.domain_set_id(),
            &domains(&["shop.com"]),
            VerificationState::Success,
        )
        .unwrap();
    assert_eq!(modified, 1);

    let set = service.get_domain_set("com.shop").unwrap().unwrap();
    assert_eq!(set.host_to_state["shop.com"], VerificationState::Success);
    assert_eq!(set.host_to_state["www.shop.com"], VerificationState::NoResponse);
    assert!(!set.host_to_state.contains_key("help.com"));

    service.connection().set_caller(10_200, 10);
    service
        .set_user_selection_for_calling_user(app.domain_set_id(), &domains(&["help.com"]), true)
        .unwrap();
    let selection = service.get_user_selection_for_calling_user("com.shop").unwrap().unwrap();
    assert!(selection.open_verified_links);
    assert!(selection.host_to_enabled["help.com"]);
    assert!(!selection.host_to_enabled["shop.com"]);
}

#[test]
fn test_upgrade_reverifies_changed_domains() {
    let (service, proxy) = boot(DomainVerificationConfig::default());
    let v1 = package(&service, "com.news", &["news.com", "old.news.com"], &[]);
    service.add_package(&v1);
    service
        .set_verification_state(
            v1.domain_set_id(),
            &domains(&["news.com", "old.news.com"]),
            VerificationState::Success,
        )
        .unwrap();
    proxy.clear();

    let v2 = package(&service, "com.news", &["news.com", "new.news.com"], &[]);
    service.migrate_package(&v1, &v2);

    assert_eq!(proxy.notified_packages(), vec!["com.news".to_string()]);
    let set = service.get_domain_set("com.news").unwrap().unwrap();
    assert_eq!(set.id, v2.domain_set_id());
    assert_eq!(set.host_to_state["news.com"], VerificationState::Success);
    assert_eq!(set.host_to_state["new.news.com"], VerificationState::NoResponse);
    assert!(!set.host_to_state.contains_key("old.news.com"));
}

#[test]
fn test_reboot_preserves_state_and_resends_once() {
    let (before, _) = boot(DomainVerificationConfig::default());
    let verified = package(&before, "com.verified", &["v.com"], &[]);
    let waiting = package(&before, "com.waiting", &["w.com"], &[]);
    before.add_package(&verified);
    before.add_package(&waiting);
    before
        .set_verification_state(
            verified.domain_set_id(),
            &domains(&["v.com"]),
            VerificationState::Success,
        )
        .unwrap();

    let mut disk = Vec::new();
    before.write_state(&mut disk).unwrap();

    let (after, proxy) = boot(DomainVerificationConfig::default());
    after.read_state(&mut disk.as_slice()).unwrap();
    assert_eq!(after.pending_count(), 2);

    for setting in [&verified, &waiting] {
        after.connection().install(setting.clone());
        after.add_package(setting);
    }
    assert_eq!(after.pending_count(), 0);
    assert!(proxy.broadcasts().is_empty());

    let batch = after.resend_pending_verification();
    assert_eq!(batch, domains(&["com.waiting"]));
    assert_eq!(proxy.broadcasts().len(), 1);

    let set = after.get_domain_set("com.verified").unwrap().unwrap();
    assert_eq!(set.id, verified.domain_set_id());
    assert_eq!(set.host_to_state["v.com"], VerificationState::Success);
}

#[test]
fn test_backup_restore_onto_new_device() {
    let (old_device, _) = boot(DomainVerificationConfig::default());
    let app = package(&old_device, "com.mail", &["mail.com", "inbox.com"], &["web.mail.com"]);
    old_device.add_package(&app);
    old_device
        .set_verification_state(
            app.domain_set_id(),
            &domains(&["mail.com"]),
            VerificationState::Success,
        )
        .unwrap();
    old_device
        .set_user_selection(app.domain_set_id(), &domains(&["web.mail.com"]), true, 0)
        .unwrap();

    let mut backup = Vec::new();
    old_device.write_state(&mut backup).unwrap();

    let (new_device, proxy) = boot(DomainVerificationConfig::default());
    new_device.restore_state(&mut backup.as_slice()).unwrap();
    assert_eq!(new_device.restored_count(), 1);

    let reinstalled = package(
        &new_device,
        "com.mail",
        &["mail.com", "inbox.com"],
        &["web.mail.com"],
    );
    assert_ne!(reinstalled.domain_set_id(), app.domain_set_id());
    new_device.add_package(&reinstalled);
    assert!(proxy.broadcasts().is_empty());

    let set = new_device.get_domain_set("com.mail").unwrap().unwrap();
    assert_eq!(set.id, reinstalled.domain_set_id());
    assert_eq!(set.host_to_state["mail.com"], VerificationState::Restored);
    assert_eq!(set.host_to_state["inbox.com"], VerificationState::NoResponse);

    let selection = new_device.get_user_selection("com.mail", 0).unwrap().unwrap();
    assert!(selection.host_to_enabled["web.mail.com"]);
}

#[test]
fn test_platform_linked_app() {
    let config = DomainVerificationConfig::default().with_linked_app("com.dialer");
    let (service, proxy) = boot(config);
    let app = package(&service, "com.dialer", &["dialer.com"], &[]);
    service.add_package(&app);

    assert!(proxy.broadcasts().is_empty());
    let set = service.get_domain_set("com.dialer").unwrap().unwrap();
    assert_eq!(set.host_to_state["dialer.com"], VerificationState::Approved);
}

#[test]
fn test_stale_token_is_rejected() {
    let (service, _) = boot(DomainVerificationConfig::default());
    let app = package(&service, "com.app", &["app.com"], &[]);
    service.add_package(&app);
    service.remove_package("com.app");

    let err = service
        .set_verification_state(
            app.domain_set_id(),
            &domains(&["app.com"]),
            VerificationState::Success,
        )
        .unwrap_err();
    assert!(err.to_string().contains("not attached"));

    let err = service
        .set_verification_state(
            DomainSetId::nil(),
            &domains(&["app.com"]),
            VerificationState::Success,
        )
        .unwrap_err();
    assert!(err.to_string().contains("null"));
}

#[test]
fn test_concurrent_callers() {
    let (service, _) = boot(DomainVerificationConfig::default());
    let apps: Vec<PackageSetting> = (0..8)
        .map(|i| {
            let host = format!("app{}.com", i);
            let app = package(&service, &format!("com.app{}", i), &[host.as_str()], &[]);
            service.add_package(&app);
            app
        })
        .collect();
    let service = Arc::new(service);

    let handles: Vec<_> = apps
        .into_iter()
        .enumerate()
        .map(|(i, app)| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let host_name = format!("app{}.com", i);
                let host = domains(&[host_name.as_str()]);
                let id = app.domain_set_id();
                service
                    .set_verification_state(id, &host, VerificationState::Success)
                    .unwrap();
                for user_id in 0..4 {
                    service.set_user_selection(id, &host, true, user_id).unwrap();
                }
                service.remove_user(3);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..8 {
        let name = format!("com.app{}", i);
        let set = service.get_domain_set(&name).unwrap().unwrap();
        assert!(set
            .host_to_state
            .values()
            .all(|state| *state == VerificationState::Success));
        for user_id in 0..3 {
            let selection = service.get_user_selection(&name, user_id).unwrap().unwrap();
            assert!(selection.host_to_enabled.values().all(|enabled| *enabled));
        }
    }
}
