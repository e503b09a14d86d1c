//! Integration tests for the inventory ledger writer: additive postings,
//! corrections, fulfillment batches, and the derived on-hand totals.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use partsledger::entities::inventory_event::InventoryEventType;
use partsledger::errors::ServiceError;
use partsledger::services::ledger::{
    CorrectStock, CreateLocation, EventsQuery, FulfillItem, StockMovement,
};

const ACTOR: i32 = 1;

fn movement(part_id: i32, location_id: i32, qty: i32) -> StockMovement {
    StockMovement {
        part_id,
        location_id,
        qty,
        reason: None,
    }
}

#[tokio::test]
async fn receive_then_fulfill_nets_on_hand() {
    let app = TestApp::new().await;
    let part = app.seed_part("FD-MUS-24-ENBL", "Mustang engine block").await;
    let shelf = app.seed_location("A-01").await;

    let event = app
        .state
        .ledger_service
        .receive(movement(part.id, shelf.id, 10), ACTOR)
        .await
        .expect("receive");
    assert_eq!(event.event_type, InventoryEventType::Receive);
    assert_eq!(event.qty_delta, 10);

    let on_hand = app
        .state
        .stock_service
        .on_hand(Some(part.id), Some(shelf.id))
        .await
        .expect("on hand");
    assert_eq!(on_hand, 10);

    let events = app
        .state
        .ledger_service
        .fulfill_batch(
            &[FulfillItem {
                part_id: part.id,
                qty: 4,
                location_id: shelf.id,
            }],
            77,
            ACTOR,
        )
        .await
        .expect("fulfill");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, InventoryEventType::Fulfill);
    assert_eq!(events[0].qty_delta, -4);
    assert_eq!(events[0].request_id, Some(77));

    let on_hand = app
        .state
        .stock_service
        .on_hand(Some(part.id), Some(shelf.id))
        .await
        .expect("on hand");
    assert_eq!(on_hand, 6);
}

#[tokio::test]
async fn additive_postings_normalize_sign() {
    let app = TestApp::new().await;
    let part = app.seed_part("CH-SIL-19-BRPD", "Silverado brake pads").await;
    let shelf = app.seed_location("B-04").await;

    let received = app
        .state
        .ledger_service
        .receive(movement(part.id, shelf.id, -5), ACTOR)
        .await
        .expect("receive");
    assert_eq!(received.qty_delta, 5);

    let returned = app
        .state
        .ledger_service
        .return_stock(movement(part.id, shelf.id, -3), ACTOR)
        .await
        .expect("return");
    assert_eq!(returned.event_type, InventoryEventType::Return);
    assert_eq!(returned.qty_delta, 3);

    let on_hand = app
        .state
        .stock_service
        .on_hand(Some(part.id), Some(shelf.id))
        .await
        .expect("on hand");
    assert_eq!(on_hand, 8);
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let part = app.seed_part("FD-F15-21-ENAL", "F-150 alternator").await;
    let shelf = app.seed_location("C-02").await;

    let err = app
        .state
        .ledger_service
        .receive(movement(part.id, shelf.id, 0), ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .ledger_service
        .correct(
            CorrectStock {
                part_id: part.id,
                location_id: shelf.id,
                qty: 0,
                reason: "cycle count".to_string(),
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn correction_requires_a_reason() {
    let app = TestApp::new().await;
    let part = app.seed_part("JP-WRA-18-SUST", "Wrangler strut").await;
    let shelf = app.seed_location("D-07").await;

    let err = app
        .state
        .ledger_service
        .correct(
            CorrectStock {
                part_id: part.id,
                location_id: shelf.id,
                qty: 3,
                reason: "   ".to_string(),
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn negative_correction_cannot_overdraw() {
    let app = TestApp::new().await;
    let part = app.seed_part("DG-CHA-15-BRRT", "Charger rotor").await;
    let shelf = app.seed_location("E-01").await;

    app.state
        .ledger_service
        .receive(movement(part.id, shelf.id, 5), ACTOR)
        .await
        .expect("receive");

    let err = app
        .state
        .ledger_service
        .correct(
            CorrectStock {
                part_id: part.id,
                location_id: shelf.id,
                qty: -8,
                reason: "shrinkage".to_string(),
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::ValidationError(msg) => {
            assert!(msg.contains("Current on-hand is 5"), "unexpected: {msg}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // The rejected correction wrote nothing.
    let on_hand = app
        .state
        .stock_service
        .on_hand(Some(part.id), Some(shelf.id))
        .await
        .expect("on hand");
    assert_eq!(on_hand, 5);

    // Draining exactly to zero is allowed.
    app.state
        .ledger_service
        .correct(
            CorrectStock {
                part_id: part.id,
                location_id: shelf.id,
                qty: -5,
                reason: "shrinkage".to_string(),
            },
            ACTOR,
        )
        .await
        .expect("correct to zero");

    let on_hand = app
        .state
        .stock_service
        .on_hand(Some(part.id), Some(shelf.id))
        .await
        .expect("on hand");
    assert_eq!(on_hand, 0);
}

#[tokio::test]
async fn positive_correction_posts_without_a_stock_check() {
    let app = TestApp::new().await;
    let part = app.seed_part("GM-SIE-20-CLRD", "Sierra radiator").await;
    let shelf = app.seed_location("F-03").await;

    // No prior events for the pair at all.
    let event = app
        .state
        .ledger_service
        .correct(
            CorrectStock {
                part_id: part.id,
                location_id: shelf.id,
                qty: 7,
                reason: "found during audit".to_string(),
            },
            ACTOR,
        )
        .await
        .expect("correct");
    assert_eq!(event.event_type, InventoryEventType::Correction);
    assert_eq!(event.qty_delta, 7);
}

#[tokio::test]
async fn unknown_part_or_location_is_not_found() {
    let app = TestApp::new().await;
    let part = app.seed_part("RM-150-22-TRDS", "Ram driveshaft").await;
    let shelf = app.seed_location("G-09").await;

    let err = app
        .state
        .ledger_service
        .receive(movement(9999, shelf.id, 1), ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = app
        .state
        .ledger_service
        .receive(movement(part.id, 9999, 1), ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn insufficient_item_rejects_the_whole_batch() {
    let app = TestApp::new().await;
    let plenty = app.seed_part("FD-EXP-17-BRCL", "Explorer caliper").await;
    let scarce = app.seed_part("FD-EXP-17-BRPD", "Explorer pads").await;
    let shelf = app.seed_location("H-02").await;

    app.state
        .ledger_service
        .receive(movement(plenty.id, shelf.id, 10), ACTOR)
        .await
        .expect("receive");
    app.state
        .ledger_service
        .receive(movement(scarce.id, shelf.id, 2), ACTOR)
        .await
        .expect("receive");

    let err = app
        .state
        .ledger_service
        .fulfill_batch(
            &[
                FulfillItem {
                    part_id: plenty.id,
                    qty: 5,
                    location_id: shelf.id,
                },
                FulfillItem {
                    part_id: scarce.id,
                    qty: 5,
                    location_id: shelf.id,
                },
            ],
            11,
            ACTOR,
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::ValidationError(msg) => {
            assert!(
                msg.contains("Insufficient stock for part FD-EXP-17-BRPD"),
                "unexpected: {msg}"
            );
            assert!(msg.contains("Requested: 5, Available: 2"), "unexpected: {msg}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Nothing was posted for either item, including the sufficient one.
    assert_eq!(
        app.state
            .stock_service
            .on_hand(Some(plenty.id), Some(shelf.id))
            .await
            .expect("on hand"),
        10
    );
    assert_eq!(
        app.state
            .stock_service
            .on_hand(Some(scarce.id), Some(shelf.id))
            .await
            .expect("on hand"),
        2
    );

    let (fulfills, total) = app
        .state
        .ledger_service
        .events(EventsQuery {
            part_id: None,
            location_id: None,
            event_type: Some(InventoryEventType::Fulfill),
            page: 1,
            limit: 20,
        })
        .await
        .expect("events");
    assert!(fulfills.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .ledger_service
        .fulfill_batch(&[], 1, ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn events_paginate_newest_first() {
    let app = TestApp::new().await;
    let part = app.seed_part("CH-CAM-23-ENSP", "Camaro spark plug").await;
    let shelf = app.seed_location("J-05").await;

    for qty in 1..=5 {
        app.state
            .ledger_service
            .receive(movement(part.id, shelf.id, qty), ACTOR)
            .await
            .expect("receive");
    }

    let (page_one, total) = app
        .state
        .ledger_service
        .events(EventsQuery {
            part_id: Some(part.id),
            location_id: None,
            event_type: None,
            page: 1,
            limit: 2,
        })
        .await
        .expect("events");
    assert_eq!(total, 5);
    assert_eq!(page_one.len(), 2);
    assert!(page_one[0].created_at >= page_one[1].created_at);

    let (page_three, _) = app
        .state
        .ledger_service
        .events(EventsQuery {
            part_id: Some(part.id),
            location_id: None,
            event_type: None,
            page: 3,
            limit: 2,
        })
        .await
        .expect("events");
    assert_eq!(page_three.len(), 1);
}

#[tokio::test]
async fn locations_are_unique_by_name() {
    let app = TestApp::new().await;

    app.state
        .ledger_service
        .create_location(CreateLocation {
            name: "Yard Row 1".to_string(),
            description: Some("outdoor".to_string()),
        })
        .await
        .expect("create location");

    let err = app
        .state
        .ledger_service
        .create_location(CreateLocation {
            name: "Yard Row 1".to_string(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    app.state
        .ledger_service
        .create_location(CreateLocation {
            name: "Aisle 9".to_string(),
            description: None,
        })
        .await
        .expect("create location");

    let locations = app
        .state
        .ledger_service
        .list_locations()
        .await
        .expect("list locations");
    let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Aisle 9", "Yard Row 1"]);
}
