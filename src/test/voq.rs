use crate::net::{PacketId, RackId, VoqBank, VoqClass};

fn bank(capacity: usize) -> VoqBank {
    VoqBank::new(RackId(0), 4, capacity)
}

#[test]
fn enqueue_dequeue_preserves_fifo_order_per_destination() {
    let mut bank = bank(8);
    for id in 0..3 {
        assert!(bank
            .enqueue(PacketId(id), RackId(1), VoqClass::Local)
            .is_ok());
    }
    assert_eq!(bank.queue_size(RackId(1), VoqClass::Local), 3);
    assert_eq!(bank.dequeue(RackId(1), VoqClass::Local), Some(PacketId(0)));
    assert_eq!(bank.dequeue(RackId(1), VoqClass::Local), Some(PacketId(1)));
    assert_eq!(bank.dequeue(RackId(1), VoqClass::Local), Some(PacketId(2)));
    assert_eq!(bank.dequeue(RackId(1), VoqClass::Local), None);
}

#[test]
fn full_queue_rejects_new_packet_and_keeps_head() {
    let mut bank = bank(2);
    assert!(bank.enqueue(PacketId(10), RackId(2), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(11), RackId(2), VoqClass::Local).is_ok());

    let rejected = bank
        .enqueue(PacketId(12), RackId(2), VoqClass::Local)
        .expect_err("tail drop");
    assert_eq!(rejected, PacketId(12));
    assert_eq!(bank.queue_size(RackId(2), VoqClass::Local), 2);
    assert_eq!(bank.dequeue(RackId(2), VoqClass::Local), Some(PacketId(10)));
}

#[test]
fn capacity_is_per_queue_not_per_bank() {
    let mut bank = bank(1);
    assert!(bank.enqueue(PacketId(0), RackId(1), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(1), RackId(2), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(2), RackId(1), VoqClass::Nonlocal).is_ok());
    assert!(bank.enqueue(PacketId(3), RackId(1), VoqClass::Local).is_err());
    assert_eq!(bank.total_packets(), 3);
}

#[test]
fn local_and_nonlocal_classes_are_independent() {
    let mut bank = bank(8);
    assert!(bank.enqueue(PacketId(1), RackId(3), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(2), RackId(3), VoqClass::Nonlocal).is_ok());

    assert!(bank.has_packets(RackId(3), VoqClass::Local));
    assert!(bank.has_packets(RackId(3), VoqClass::Nonlocal));
    assert_eq!(bank.dequeue(RackId(3), VoqClass::Nonlocal), Some(PacketId(2)));
    assert!(!bank.has_packets(RackId(3), VoqClass::Nonlocal));
    assert!(bank.has_packets(RackId(3), VoqClass::Local));
}

#[test]
fn own_rack_destination_is_rejected() {
    let mut bank = bank(8);
    assert_eq!(
        bank.enqueue(PacketId(0), RackId(0), VoqClass::Local),
        Err(PacketId(0))
    );
    assert_eq!(bank.total_packets(), 0);
}

#[test]
fn out_of_topology_destination_is_rejected() {
    let mut bank = bank(8);
    assert_eq!(
        bank.enqueue(PacketId(0), RackId(9), VoqClass::Nonlocal),
        Err(PacketId(0))
    );
}

#[test]
fn nonempty_destinations_are_sorted_by_rack_id() {
    let mut bank = bank(8);
    assert!(bank.enqueue(PacketId(0), RackId(3), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(1), RackId(1), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(2), RackId(2), VoqClass::Nonlocal).is_ok());

    assert_eq!(
        bank.nonempty_destinations(VoqClass::Local),
        vec![RackId(1), RackId(3)]
    );
    assert_eq!(
        bank.nonempty_destinations(VoqClass::Nonlocal),
        vec![RackId(2)]
    );
}

#[test]
fn total_packets_tracks_enqueues_and_dequeues() {
    let mut bank = bank(8);
    assert!(bank.is_empty());
    assert!(bank.enqueue(PacketId(0), RackId(1), VoqClass::Local).is_ok());
    assert!(bank.enqueue(PacketId(1), RackId(2), VoqClass::Nonlocal).is_ok());
    assert_eq!(bank.total_packets(), 2);
    assert!(!bank.is_empty());

    bank.dequeue(RackId(1), VoqClass::Local);
    assert_eq!(bank.total_packets(), 1);
    bank.dequeue(RackId(2), VoqClass::Nonlocal);
    assert!(bank.is_empty());
}
