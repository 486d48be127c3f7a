use crate::config::{SimConfig, WorkloadKind};
use crate::net::FlowKind;
use crate::workload::{
    load_flows_from_file, save_flows_to_file, WorkloadError, WorkloadGenerator,
};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_file(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    std::env::temp_dir().join(format!("rotorsim-{prefix}-{}-{nanos}.csv", std::process::id()))
}

fn gen_config(workload: WorkloadKind) -> SimConfig {
    SimConfig {
        num_racks: 8,
        num_switches: 4,
        hosts_per_rack: 4,
        workload,
        load_factor: 0.2,
        sim_time_ms: 50.0,
        ..SimConfig::default()
    }
}

#[test]
fn zero_load_factor_generates_no_flows() {
    let config = SimConfig {
        load_factor: 0.0,
        ..gen_config(WorkloadKind::Datamining)
    };
    let flows = WorkloadGenerator::new(&config).generate_flows();
    assert!(flows.is_empty());
}

#[test]
fn generated_flows_are_inter_rack_and_inside_the_horizon() {
    let config = gen_config(WorkloadKind::Websearch);
    let flows = WorkloadGenerator::new(&config).generate_flows();
    assert!(!flows.is_empty());

    for flow in &flows {
        assert_ne!(flow.src_rack, flow.dst_rack);
        assert!(flow.src_rack.0 < config.num_racks);
        assert!(flow.dst_rack.0 < config.num_racks);
        assert!(flow.src_host < config.hosts_per_rack);
        assert!(flow.dst_host < config.hosts_per_rack);
        assert!(flow.start_time_ms >= 0.0);
        assert!(flow.start_time_ms < config.sim_time_ms);
        assert_eq!(flow.kind, FlowKind::Bulk);
    }

    // ids are dense and start times non-decreasing
    for (i, flow) in flows.iter().enumerate() {
        assert_eq!(flow.id.0, i as u64);
    }
    for pair in flows.windows(2) {
        assert!(pair[0].start_time_ms <= pair[1].start_time_ms);
    }
}

#[test]
fn sampled_sizes_stay_within_the_cdf_support() {
    let bounds = [
        (WorkloadKind::Datamining, 100, 1_000_000_000),
        (WorkloadKind::Websearch, 100, 300_000_000),
        (WorkloadKind::Hadoop, 1_000, 1_000_000_000),
    ];
    for (kind, min, max) in bounds {
        let flows = WorkloadGenerator::new(&gen_config(kind)).generate_flows();
        assert!(!flows.is_empty());
        for flow in &flows {
            assert!(
                (min..=max).contains(&flow.size_bytes),
                "{kind}: size {} outside [{min}, {max}]",
                flow.size_bytes
            );
        }
    }
}

#[test]
fn same_seed_generates_identical_workloads() {
    let config = gen_config(WorkloadKind::Hadoop);
    let a = WorkloadGenerator::new(&config).generate_flows();
    let b = WorkloadGenerator::new(&config).generate_flows();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.src_rack, y.src_rack);
        assert_eq!(x.dst_rack, y.dst_rack);
        assert_eq!(x.size_bytes, y.size_bytes);
        assert_eq!(x.start_time_ms, y.start_time_ms);
    }

    let other_seed = SimConfig {
        random_seed: 7,
        ..config
    };
    let c = WorkloadGenerator::new(&other_seed).generate_flows();
    let identical = a.len() == c.len()
        && a.iter()
            .zip(&c)
            .all(|(x, y)| x.size_bytes == y.size_bytes && x.src_rack == y.src_rack);
    assert!(!identical, "different seeds produced the same workload");
}

#[test]
fn flow_csv_round_trips() {
    let config = gen_config(WorkloadKind::Datamining);
    let flows = WorkloadGenerator::new(&config).generate_flows();
    assert!(!flows.is_empty());

    let path = unique_temp_file("roundtrip");
    save_flows_to_file(&flows, &path).expect("save");
    let loaded = load_flows_from_file(&path, &config).expect("load");
    fs::remove_file(&path).ok();

    assert_eq!(flows.len(), loaded.len());
    for (orig, back) in flows.iter().zip(&loaded) {
        assert_eq!(orig.id, back.id);
        assert_eq!(orig.src_rack, back.src_rack);
        assert_eq!(orig.dst_rack, back.dst_rack);
        assert_eq!(orig.src_host, back.src_host);
        assert_eq!(orig.dst_host, back.dst_host);
        assert_eq!(orig.size_bytes, back.size_bytes);
        assert_eq!(orig.start_time_ms, back.start_time_ms);
        assert_eq!(orig.kind, back.kind);
    }
}

#[test]
fn loader_requires_a_header_line() {
    let path = unique_temp_file("no-header");
    fs::write(&path, "").expect("write");
    let err = load_flows_from_file(&path, &SimConfig::default()).expect_err("empty file");
    fs::remove_file(&path).ok();
    assert!(matches!(err, WorkloadError::Malformed { line: 1, .. }));
}

#[test]
fn loader_rejects_malformed_rows() {
    let header = "flow_id,src_rack,dst_rack,src_host,dst_host,size_bytes,start_time_ms,flow_type";
    let cases = [
        ("0,1,2,0,0,1000,0.5", "field count"),
        ("0,1,2,0,0,xyz,0.5,bulk", "size"),
        ("0,1,2,0,0,1000,0.5,express", "flow type"),
        ("0,3,3,0,0,1000,0.5,bulk", "intra-rack"),
        ("0,99,2,0,0,1000,0.5,bulk", "rack range"),
    ];
    for (row, what) in cases {
        let path = unique_temp_file("malformed");
        fs::write(&path, format!("{header}\n{row}\n")).expect("write");
        let result = load_flows_from_file(&path, &SimConfig::default());
        fs::remove_file(&path).ok();
        assert!(
            matches!(result, Err(WorkloadError::Malformed { line: 2, .. })),
            "row with bad {what} was accepted"
        );
    }
}

#[test]
fn loader_accepts_low_latency_rows_and_blank_lines() {
    let path = unique_temp_file("low-latency");
    fs::write(
        &path,
        "flow_id,src_rack,dst_rack,src_host,dst_host,size_bytes,start_time_ms,flow_type\n\
         7,0,3,1,2,123456,1.25,low_latency\n\n",
    )
    .expect("write");
    let flows = load_flows_from_file(&path, &SimConfig::default()).expect("load");
    fs::remove_file(&path).ok();

    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].id.0, 7);
    assert_eq!(flows[0].kind, FlowKind::LowLatency);
    assert_eq!(flows[0].start_time_ms, 1.25);
}
