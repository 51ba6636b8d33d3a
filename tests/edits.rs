use signal_net::error::Error;
use signal_net::gate::Lifecycle;
use signal_net::logic::{Logic, LogicCircuit};

fn get_simple_example() -> LogicCircuit {
    let circuit = LogicCircuit::new("example".to_string());

    let a = circuit.insert_gate(Logic::Buf, "a".into()).unwrap();
    let b = circuit.insert_gate(Logic::Buf, "b".into()).unwrap();
    let and = circuit.insert_gate(Logic::And, "inst_0".into()).unwrap();

    circuit.connect(a.output(), and.get_input(0)).unwrap();
    circuit.connect(b.output(), and.get_input(1)).unwrap();

    circuit
}

#[test]
fn disconnect_grounds_input() {
    let circuit = get_simple_example();
    let a = circuit.get_gate(&"a".into()).unwrap();
    let b = circuit.get_gate(&"b".into()).unwrap();
    let and = circuit.last().unwrap();
    a.get_input(0).set_state(true).unwrap();
    b.get_input(0).set_state(true).unwrap();
    assert!(and.state());

    let id = circuit
        .connections()
        .find(|c| c.src() == *a.output())
        .unwrap()
        .id();
    let removed = circuit.disconnect(id).unwrap();
    assert_eq!(removed.to_string(), "a.Y -> inst_0.A");
    assert!(!and.get_input(0).state());
    assert!(!and.state());
    assert_eq!(circuit.num_connections(), 1);

    // The old driver no longer reaches the gate
    a.get_input(0).set_state(false).unwrap();
    a.get_input(0).set_state(true).unwrap();
    assert!(!and.state());

    assert_eq!(circuit.disconnect(id).unwrap_err(), Error::UnknownConnection(id));
}

#[test]
fn rewire_after_disconnect() {
    let circuit = get_simple_example();
    let a = circuit.get_gate(&"a".into()).unwrap();
    let b = circuit.get_gate(&"b".into()).unwrap();
    let and = circuit.last().unwrap();

    let id = circuit.connections().next().unwrap().id();
    circuit.disconnect(id).unwrap();
    assert!(circuit.get_connection(id).is_none());

    // b now drives both inputs of the AND gate
    let id = circuit.connect(b.output(), and.get_input(0)).unwrap();
    assert_eq!(circuit.get_driver(and.get_input(0)), Some(b.output().clone()));
    assert_eq!(circuit.get_connection(id).unwrap().src_gate(), Some(b.clone()));

    b.get_input(0).set_state(true).unwrap();
    assert!(and.state());
    a.get_input(0).set_state(true).unwrap();
    b.get_input(0).set_state(false).unwrap();
    assert!(!and.state());
}

#[test]
fn remove_gate() {
    let circuit = get_simple_example();
    let a = circuit.get_gate(&"a".into()).unwrap();
    let and = circuit.last().unwrap();
    a.get_input(0).set_state(true).unwrap();
    assert!(and.get_input(0).state());

    circuit.remove_gate(&a).unwrap();
    assert_eq!(circuit.num_gates(), 2);
    assert_eq!(circuit.num_connections(), 1);
    assert!(!circuit.contains(&a));
    assert_eq!(a.status(), Lifecycle::Destroyed);
    assert!(!and.get_input(0).state());
    assert_eq!(a.output().num_listeners(), 0);

    assert_eq!(
        circuit.remove_gate(&a).unwrap_err(),
        Error::UnknownGate("a".into())
    );

    // The name is free again
    let a2 = circuit.insert_gate(Logic::Const(true), "a".into()).unwrap();
    circuit.connect(a2.output(), and.get_input(0)).unwrap();
    assert!(and.get_input(0).state());
}

#[test]
fn remove_driven_gate() {
    let circuit = get_simple_example();
    let a = circuit.get_gate(&"a".into()).unwrap();
    let and = circuit.last().unwrap();
    circuit.remove_gate(&and).unwrap();

    assert_eq!(circuit.num_connections(), 0);
    assert!(circuit.get_users(a.output()).is_empty());
    assert!(a.output().fan_out().is_empty());
    a.get_input(0).set_state(true).unwrap();
    assert!(a.state());
    assert!(!and.get_input(0).state());
}

#[test]
fn destroy_stops_recomputation() {
    let circuit = get_simple_example();
    let and = circuit.last().unwrap();
    let a = circuit.get_gate(&"a".into()).unwrap();
    let b = circuit.get_gate(&"b".into()).unwrap();
    b.get_input(0).set_state(true).unwrap();

    and.destroy();
    a.get_input(0).set_state(true).unwrap();

    // The wire still updates the pin, but the gate no longer reacts
    assert!(and.get_input(0).state());
    assert!(!and.state());
    assert_eq!(and.initialize(), Err(Error::Destroyed("inst_0".into())));
}

#[test]
fn remove_listener_stops_notifications() {
    use std::cell::Cell;
    use std::rc::Rc;

    let circuit = get_simple_example();
    let and = circuit.last().unwrap();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let id = and.output().add_listener(move |_| c.set(c.get() + 1));

    for name in ["a", "b"] {
        let gate = circuit.get_gate(&name.into()).unwrap();
        gate.get_input(0).set_state(true).unwrap();
    }
    assert_eq!(calls.get(), 1);

    assert!(and.output().remove_listener(id));
    circuit.first().unwrap().get_input(0).set_state(false).unwrap();
    assert!(!and.state());
    assert_eq!(calls.get(), 1);
}

#[test]
fn clear() {
    let circuit = get_simple_example();
    let gates: Vec<_> = circuit.gates().collect();
    let a = gates[0].clone();
    let and = gates[2].clone();

    circuit.clear();
    assert_eq!(circuit.num_gates(), 0);
    assert_eq!(circuit.num_connections(), 0);
    assert!(gates.iter().all(|g| g.status() == Lifecycle::Destroyed));

    a.get_input(0).set_state(true).unwrap();
    assert!(!a.state());
    assert!(!and.get_input(0).state());
    assert_eq!(circuit.to_string(), "circuit example {\n}\n");
}
