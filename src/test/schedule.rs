use crate::config::SimConfig;
use crate::net::{rounds_for_test, RackId, RotorSchedule, SwitchId};
use crate::sim::SimTime;

fn config(num_racks: usize, num_switches: usize) -> SimConfig {
    SimConfig {
        num_racks,
        num_switches,
        hosts_per_rack: 1,
        ..SimConfig::default()
    }
}

#[test]
fn round_robin_rounds_are_perfect_matchings_for_even_racks() {
    for n in [2, 4, 8, 16] {
        let rounds = rounds_for_test(n);
        assert_eq!(rounds.len(), n - 1);
        for round in &rounds {
            for (rack, peer) in round.iter().enumerate() {
                let peer = peer.expect("even rack count leaves nobody idle");
                assert_ne!(peer.0, rack, "self-pairing in round");
                assert_eq!(round[peer.0], Some(RackId(rack)), "pairing not symmetric");
            }
        }
    }
}

#[test]
fn round_robin_rounds_cover_every_pair_exactly_once() {
    for n in [4, 5, 8, 9] {
        let rounds = rounds_for_test(n);
        let mut seen = vec![vec![0usize; n]; n];
        for round in &rounds {
            for (rack, peer) in round.iter().enumerate() {
                if let Some(peer) = peer {
                    seen[rack][peer.0] += 1;
                }
            }
        }
        for u in 0..n {
            for v in 0..n {
                let expected = usize::from(u != v);
                assert_eq!(seen[u][v], expected, "pair ({u},{v}) seen {} times", seen[u][v]);
            }
        }
    }
}

#[test]
fn odd_rack_counts_idle_exactly_one_rack_per_round() {
    let rounds = rounds_for_test(5);
    assert_eq!(rounds.len(), 5);
    for round in &rounds {
        let idle = round.iter().filter(|peer| peer.is_none()).count();
        assert_eq!(idle, 1);
    }
}

#[test]
fn link_is_down_during_reconfiguration_phase() {
    let config = config(4, 2);
    let sched = RotorSchedule::new(&config);

    // slot is 200us with a 20us dead phase at the top
    for rack in 0..4 {
        assert_eq!(
            sched.connected_rack(RackId(rack), SwitchId(0), SimTime::ZERO),
            None
        );
        assert_eq!(
            sched.connected_rack(RackId(rack), SwitchId(0), SimTime::from_micros(19)),
            None
        );
        assert!(sched
            .connected_rack(RackId(rack), SwitchId(0), SimTime::from_micros(20))
            .is_some());
    }
}

#[test]
fn out_of_range_switch_has_no_connection() {
    let config = config(4, 2);
    let sched = RotorSchedule::new(&config);
    assert_eq!(
        sched.connected_rack(RackId(0), SwitchId(9), SimTime::from_micros(20)),
        None
    );
}

#[test]
fn connectivity_is_periodic_in_the_cycle() {
    let config = config(8, 3);
    let sched = RotorSchedule::new(&config);
    let cycle = sched.cycle_time();

    for u in 0..8 {
        for v in 0..8 {
            for t_us in [0, 21, 137, 200, 555, 799] {
                let t = SimTime::from_micros(t_us);
                assert_eq!(
                    sched.has_direct_path(RackId(u), RackId(v), t),
                    sched.has_direct_path(RackId(u), RackId(v), t.saturating_add(cycle)),
                    "periodicity broken at ({u},{v},{t_us}us)"
                );
            }
        }
    }
}

#[test]
fn every_pair_gets_a_direct_path_within_one_cycle() {
    for (racks, switches) in [(4, 2), (8, 4), (8, 1), (5, 2), (16, 4)] {
        let config = config(racks, switches);
        let sched = RotorSchedule::new(&config);
        let cycle = sched.cycle_time();

        for u in 0..racks {
            for v in 0..racks {
                if u == v {
                    continue;
                }
                for t0_us in [0, 33, 190, 260] {
                    let t0 = SimTime::from_micros(t0_us);
                    let t = sched.next_direct_path_time(RackId(u), RackId(v), t0);
                    assert!(t >= t0);
                    assert!(
                        t.saturating_sub(t0) < cycle,
                        "({u},{v}) at t0={t0_us}us waits a full cycle (R={racks}, S={switches})"
                    );
                    assert!(
                        sched.has_direct_path(RackId(u), RackId(v), t),
                        "predicted time has no direct path for ({u},{v}) at t0={t0_us}us"
                    );
                }
            }
        }
    }
}

#[test]
fn next_direct_path_is_now_when_circuit_is_up() {
    let config = config(4, 2);
    let sched = RotorSchedule::new(&config);

    // find some pair connected in the first slot's active phase
    let t = SimTime::from_micros(20);
    let peer = sched
        .connected_rack(RackId(0), SwitchId(0), t)
        .expect("active phase");
    assert_eq!(sched.next_direct_path_time(RackId(0), peer, t), t);

    // later within the same active window the answer is still "now"
    let later = SimTime::from_micros(150);
    assert_eq!(sched.next_direct_path_time(RackId(0), peer, later), later);
}

#[test]
fn r4_s2_cycle_matches_hand_computation() {
    // ceil(3/2) = 2 matchings per switch, 200us slots -> 400us cycle
    let config = config(4, 2);
    let sched = RotorSchedule::new(&config);
    assert_eq!(sched.num_matchings(), 2);
    assert_eq!(sched.slot_time(), SimTime::from_micros(200));
    assert_eq!(sched.cycle_time(), SimTime::from_micros(400));
}
