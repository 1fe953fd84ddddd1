use crate::test::{creator, form, setup, setup_with_pool, scenario_terms, T0};
use crate::{Address, PoolError, PoolEvent};

#[test]
fn test_pool_initialized_event() {
    let (_clock, engine) = setup();
    let pool_id = engine.init_pool(&creator(), scenario_terms()).unwrap();

    let events = engine.drain_events();
    assert_eq!(
        events,
        vec![PoolEvent::PoolInitialized {
            pool_id,
            creator: creator(),
            token: Address::new("CXLMTOKEN"),
            total_goal: 1_000,
            timestamp: T0,
        }]
    );
    assert_eq!(events[0].topic(), "init");
    assert_eq!(events[0].actor(), Some(&creator()));
}

#[test]
fn test_donation_received_event() {
    let (clock, engine) = setup_with_pool();
    engine.drain_events();
    clock.set(T0 + 10);

    let donor = Address::new("GDONOR");
    engine.donate(&donor, 300).unwrap();
    engine.donate(&donor, 50).unwrap();

    let events = engine.drain_events();
    let last = events.last().expect("No events found");
    assert_eq!(
        last,
        &PoolEvent::DonationReceived {
            donor: donor.clone(),
            amount: 50,
            new_balance: 350,
            timestamp: T0 + 10,
        }
    );
    assert_eq!(last.topic(), "donated");
    assert_eq!(last.amount(), Some(50));
}

#[test]
fn test_application_submitted_event() {
    let (clock, engine) = setup_with_pool();
    engine.drain_events();
    clock.set(T0 + 20);

    let student = Address::new("GSTUDENT");
    engine
        .apply_for_scholarship(&student, form("Sam", 380, 70))
        .unwrap();

    let events = engine.drain_events();
    assert_eq!(
        events,
        vec![PoolEvent::ApplicationSubmitted {
            student,
            timestamp: T0 + 20,
        }]
    );
    assert_eq!(events[0].amount(), None);
}

#[test]
fn test_approval_and_payout_events() {
    let (clock, engine) = setup_with_pool();
    engine.donate(&Address::new("GDONOR"), 300).unwrap();
    engine
        .apply_for_scholarship(&Address::new("GSTUDENT"), form("Sam", 380, 70))
        .unwrap();
    engine.drain_events();

    clock.set(T0 + 150);
    engine.approve_scholarships(&creator()).unwrap();
    let approved = engine.drain_events();
    assert_eq!(
        approved,
        vec![PoolEvent::ScholarshipApproved {
            student: Address::new("GSTUDENT"),
            amount: 300,
            timestamp: T0 + 150,
        }]
    );
    assert_eq!(approved[0].topic(), "approved");

    clock.set(T0 + 200);
    engine.distribute_scholarships(&creator()).unwrap();
    let distributed = engine.drain_events();
    assert_eq!(
        distributed,
        vec![
            PoolEvent::ScholarshipPaid {
                student: Address::new("GSTUDENT"),
                amount: 300,
                timestamp: T0 + 200,
            },
            PoolEvent::PoolClosed {
                total_distributed: 300,
                remaining_balance: 0,
                timestamp: T0 + 200,
            },
        ]
    );
    assert_eq!(distributed[1].topic(), "closed");
    assert_eq!(distributed[1].actor(), None);

    // Repeating the distribution pays nobody and does not close twice.
    engine.distribute_scholarships(&creator()).unwrap();
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_failed_operations_emit_nothing() {
    let (clock, engine) = setup_with_pool();
    engine.drain_events();

    assert_eq!(
        engine.donate(&Address::new("GDONOR"), 0),
        Err(PoolError::InvalidAmount)
    );
    assert_eq!(
        engine.approve_scholarships(&creator()),
        Err(PoolError::ApplicationsStillOpen)
    );
    clock.set(T0 + 120);
    assert_eq!(
        engine.apply_for_scholarship(&Address::new("GS"), form("Sam", 380, 70)),
        Err(PoolError::ApplicationDeadlinePassed)
    );
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_drain_empties_the_journal() {
    let (_clock, engine) = setup_with_pool();
    assert_eq!(engine.drain_events().len(), 1);
    assert!(engine.drain_events().is_empty());
}
