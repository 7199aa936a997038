use rust_decimal::Decimal;

use super::common::{actor, open_deal, rig, seed_market, CAPTURING_BROKER, PROPERTY};
use crate::deals::domain::{
    BrokerId, ClientId, DocumentKind, DocumentReviewStatus, NegotiationId, PropertyId,
    PropertyRecord,
};
use crate::deals::error::{DealError, ValidationError};
use crate::deals::service::OpenDraft;

#[test]
fn commit_makes_mutations_visible() {
    let rig = rig();
    let id = PropertyId("prop-500".into());
    rig.transactions
        .run(|tx| {
            tx.insert_property(PropertyRecord::available(
                id.clone(),
                "Av. Atlantica 900",
                Decimal::from(750_000),
            ));
            Ok(())
        })
        .unwrap();

    let stored = rig.store.property(&id).unwrap();
    assert_eq!(stored.address, "Av. Atlantica 900");
}

#[test]
fn rollback_discards_every_mutation_in_the_unit() {
    let rig = rig();
    let property_id = PropertyId("prop-500".into());
    let negotiation_id = NegotiationId("neg-phantom".into());

    let result: Result<(), DealError> = rig.transactions.run(|tx| {
        tx.insert_property(PropertyRecord::available(
            property_id.clone(),
            "Av. Atlantica 900",
            Decimal::from(750_000),
        ));
        tx.insert_document(
            negotiation_id.clone(),
            "matricula.pdf",
            DocumentKind::Supporting,
            DocumentReviewStatus::Pending,
            None,
        );
        Err(DealError::NegotiationNotFound(NegotiationId(
            "forced".into(),
        )))
    });

    assert!(result.is_err());
    assert!(rig.store.property(&property_id).is_none());
    assert!(rig.store.documents_for(&negotiation_id).is_empty());
}

#[test]
fn rollback_retracts_allocated_identifiers() {
    let rig = rig();
    let negotiation_id = NegotiationId("neg-phantom".into());

    let failed: Result<(), DealError> = rig.transactions.run(|tx| {
        tx.insert_document(
            negotiation_id.clone(),
            "discarded.pdf",
            DocumentKind::Supporting,
            DocumentReviewStatus::Pending,
            None,
        );
        Err(DealError::NegotiationNotFound(NegotiationId(
            "forced".into(),
        )))
    });
    assert!(failed.is_err());

    let document = rig
        .transactions
        .run(|tx| {
            Ok(tx.insert_document(
                negotiation_id.clone(),
                "kept.pdf",
                DocumentKind::Supporting,
                DocumentReviewStatus::Pending,
                None,
            ))
        })
        .unwrap();
    assert_eq!(document.id.0, "doc-000001");
}

#[test]
fn negotiation_identifiers_are_sequential() {
    let rig = rig();
    seed_market(&rig);
    rig.transactions
        .run(|tx| {
            tx.insert_property(PropertyRecord::available(
                PropertyId("prop-200".into()),
                "Rua do Carmo 11",
                Decimal::from(420_000),
            ));
            Ok(())
        })
        .unwrap();

    let first = open_deal(&rig);
    let second = rig
        .service
        .open_draft(OpenDraft {
            property_id: PropertyId("prop-200".into()),
            capturing_broker_id: BrokerId(CAPTURING_BROKER.into()),
            buyer_client_id: None,
        })
        .unwrap();

    assert_eq!(first.id.0, "neg-000001");
    assert_eq!(second.id.0, "neg-000002");
    assert_eq!(first.version, 1);
}

#[test]
fn rejects_draft_for_unknown_property() {
    let rig = rig();
    seed_market(&rig);

    let result = rig.service.open_draft(OpenDraft {
        property_id: PropertyId("prop-999".into()),
        capturing_broker_id: BrokerId(CAPTURING_BROKER.into()),
        buyer_client_id: None,
    });

    match result {
        Err(DealError::PropertyNotFound(id)) => assert_eq!(id.0, "prop-999"),
        other => panic!("expected missing property error, got {other:?}"),
    }
}

#[test]
fn one_active_negotiation_per_property() {
    let rig = rig();
    seed_market(&rig);
    let first = open_deal(&rig);

    let second = rig.service.open_draft(OpenDraft {
        property_id: PropertyId(PROPERTY.into()),
        capturing_broker_id: BrokerId(CAPTURING_BROKER.into()),
        buyer_client_id: Some(ClientId("client-88".into())),
    });
    match second {
        Err(DealError::Validation(ValidationError::ActiveNegotiationExists { property_id })) => {
            assert_eq!(property_id.0, PROPERTY);
        }
        other => panic!("expected active negotiation rejection, got {other:?}"),
    }

    // A terminal outcome frees the property for a new deal.
    rig.service.cancel(&first.id, &actor()).unwrap();
    let reopened = open_deal(&rig);
    assert_eq!(reopened.id.0, "neg-000002");
}
