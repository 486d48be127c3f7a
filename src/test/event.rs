use crate::net::{FlowId, PacketId, RackId};
use crate::sim::{EventQueue, SimEvent, SimTime};

#[test]
fn events_pop_in_time_order() {
    let mut q = EventQueue::default();
    q.schedule(SimTime(10), SimEvent::FlowArrival(FlowId(1)));
    q.schedule(SimTime(5), SimEvent::FlowArrival(FlowId(2)));
    q.schedule(SimTime(20), SimEvent::FlowArrival(FlowId(3)));

    assert_eq!(q.pop(), Some((SimTime(5), SimEvent::FlowArrival(FlowId(2)))));
    assert_eq!(q.pop(), Some((SimTime(10), SimEvent::FlowArrival(FlowId(1)))));
    assert_eq!(q.pop(), Some((SimTime(20), SimEvent::FlowArrival(FlowId(3)))));
    assert_eq!(q.pop(), None);
}

#[test]
fn equal_time_events_pop_in_insertion_order() {
    let mut q = EventQueue::default();
    q.schedule(SimTime(7), SimEvent::PacketArrival(PacketId(0)));
    q.schedule(SimTime(7), SimEvent::TransmissionComplete(PacketId(1)));
    q.schedule(SimTime(7), SimEvent::RackWakeup(RackId(2)));

    assert_eq!(q.pop(), Some((SimTime(7), SimEvent::PacketArrival(PacketId(0)))));
    assert_eq!(
        q.pop(),
        Some((SimTime(7), SimEvent::TransmissionComplete(PacketId(1))))
    );
    assert_eq!(q.pop(), Some((SimTime(7), SimEvent::RackWakeup(RackId(2)))));
}

#[test]
fn peek_time_does_not_consume() {
    let mut q = EventQueue::default();
    assert_eq!(q.peek_time(), None);
    assert!(q.is_empty());

    q.schedule(SimTime(3), SimEvent::RackWakeup(RackId(0)));
    assert_eq!(q.peek_time(), Some(SimTime(3)));
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop(), Some((SimTime(3), SimEvent::RackWakeup(RackId(0)))));
    assert!(q.is_empty());
}
