use dbm_ticket_flow::dns::{FileDnsBackend, RedisDnsManageService};
use dbm_ticket_flow::dns::store::{DnsStoreFile, DomainRecord};
use dbm_ticket_flow::flow::{FlowStep, StepInputs, StepLog, StepLogLevel};
use serde_json::{Value, json};

fn inputs(kwargs: Value, trans_data: Value) -> StepInputs {
    StepInputs {
        kwargs,
        global_data: json!({"bk_biz_id": 3}),
        trans_data,
    }
}

fn record(domain: &str, instance: &str) -> DomainRecord {
    DomainRecord {
        bk_biz_id: 3,
        bk_cloud_id: 0,
        domain_name: domain.to_string(),
        instance: instance.to_string(),
    }
}

#[test]
fn create_then_recycle_against_the_file_store() {
    let temp = tempfile::tempdir().unwrap();
    let backend = FileDnsBackend::new(temp.path().join("dns").join("records.json"));
    let service = RedisDnsManageService::new(backend.clone());

    let mut log = StepLog::new("create");
    let created = service.run(
        &inputs(
            json!({
                "dns_op_type": "create",
                "exec_ip": ["1.1.1.1"],
                "get_trans_data_ip_var": "new_proxy_ips",
                "dns_op_exec_port": 50000,
                "add_domain_name": "cache.demo.db"
            }),
            json!({"new_proxy_ips": [{"ip": "1.1.1.2"}, "1.1.1.1"]}),
        ),
        &mut log,
    );
    assert!(created);
    let store = backend.load().unwrap();
    assert_eq!(
        store.records,
        vec![
            record("cache.demo.db", "1.1.1.1#50000"),
            record("cache.demo.db", "1.1.1.2#50000"),
        ]
    );

    let mut log = StepLog::new("recycle");
    let recycled = service.run(
        &inputs(
            json!({
                "dns_op_type": "recycle_record",
                "exec_ip": ["1.1.1.1"],
                "dns_op_exec_port": 50000
            }),
            json!({}),
        ),
        &mut log,
    );
    assert!(recycled);
    assert_eq!(
        backend.load().unwrap().records,
        vec![record("cache.demo.db", "1.1.1.2#50000")]
    );
}

#[test]
fn update_and_cluster_delete_rewrite_the_store() {
    let temp = tempfile::tempdir().unwrap();
    let backend = FileDnsBackend::new(temp.path().join("records.json"));
    let mut store = DnsStoreFile {
        records: vec![
            record("cache.a.db", "1.1.1.1#50000"),
            record("cache.b.db", "2.2.2.2#50000"),
        ],
        ..DnsStoreFile::default()
    };
    store.clusters.insert(9, vec!["cache.b.db".to_string()]);
    backend.save(&store).unwrap();
    let service = RedisDnsManageService::new(backend.clone());

    let mut log = StepLog::new("update");
    assert!(service.run(
        &inputs(
            json!({
                "dns_op_type": "update",
                "old_instance": "1.1.1.1#50000",
                "new_instance": "1.1.1.9#50000",
                "update_domain_name": "cache.a.db"
            }),
            json!({}),
        ),
        &mut log,
    ));
    assert!(
        log.entries()
            .iter()
            .any(|entry| entry.message.contains("rst:true"))
    );

    let mut log = StepLog::new("delete");
    assert!(service.run(
        &inputs(
            json!({"dns_op_type": "cluster_delete", "delete_cluster_id": 9}),
            json!({}),
        ),
        &mut log,
    ));
    let store = backend.load().unwrap();
    assert_eq!(store.records, vec![record("cache.a.db", "1.1.1.9#50000")]);
    assert!(store.clusters.is_empty());
}

#[test]
fn update_that_matches_nothing_fails_the_step() {
    let temp = tempfile::tempdir().unwrap();
    let service = RedisDnsManageService::new(FileDnsBackend::new(temp.path().join("records.json")));
    let mut log = StepLog::new("update");
    assert!(!service.run(
        &inputs(
            json!({
                "dns_op_type": "update",
                "old_instance": "1.1.1.1#50000",
                "new_instance": "1.1.1.9#50000",
                "update_domain_name": "cache.a.db"
            }),
            json!({}),
        ),
        &mut log,
    ));
    assert!(
        log.entries()
            .iter()
            .any(|entry| entry.message.contains("rst:false"))
    );
}

#[test]
fn missing_ips_fail_without_touching_the_store() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("records.json");
    let service = RedisDnsManageService::new(FileDnsBackend::new(&path));
    let mut log = StepLog::new("create");
    assert!(!service.run(
        &inputs(
            json!({
                "dns_op_type": "create",
                "exec_ip": [],
                "dns_op_exec_port": 50000,
                "add_domain_name": "cache.demo.db"
            }),
            json!({}),
        ),
        &mut log,
    ));
    assert_eq!(log.count(StepLogLevel::Error), 1);
    assert!(!path.exists());
}
