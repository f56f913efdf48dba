//! End-to-end pay command tests against in-memory collaborators

mod common;

use std::time::Duration;

use common::{Reply, World};
use economy_pay::confirmation::ConfirmationError;
use economy_pay::permissions;
use economy_pay::{AppError, Config, DonorRank, PayCommand, RejectionReason, SettlementError};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_mythical_payment_settles() {
    let mut world = World::new(dec!(2000), Reply::Accept);
    world.permissions.grant(world.alice.id, permissions::GROUP_MYTHICAL);
    let handler = world.handler();

    let receipt = tokio_test::assert_ok!(
        handler
            .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
            .await
    );

    assert_eq!(receipt.amount, dec!(1000));
    assert_eq!(receipt.tax, dec!(112.5));
    assert_eq!(receipt.rank, DonorRank::Mythical);
    assert_eq!(receipt.lottery_contribution, 11);

    assert_eq!(world.balance(&world.alice), dec!(887.5));
    assert_eq!(world.balance(&world.bob), dec!(1000));
    assert_eq!(world.pot.total(), 11);
}

#[tokio::test]
async fn test_quote_shown_before_settlement() {
    let mut world = World::new(dec!(2000), Reply::Accept);
    world.permissions.grant(world.alice.id, permissions::GROUP_VIPPLUS);
    let handler = world.handler();

    handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap();

    let quote = world.prompt.last_quote().unwrap();
    assert_eq!(quote.rank, DonorRank::VipPlus);
    assert_eq!(quote.percent_off, 5);
    assert_eq!(quote.tax, dec!(142.5));
    assert_eq!(quote.discount_saved, dec!(7.5));
    assert_eq!(quote.lottery_contribution, 14);
    assert_eq!(quote.total_debit, dec!(1142.5));
    assert_eq!(quote.currency, "BacoBits");
}

#[tokio::test]
async fn test_rejected_payment_never_prompts() {
    let world = World::new(dec!(100), Reply::Accept);
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "100"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Rejected(RejectionReason::InsufficientFunds)
    ));
    assert_eq!(err.error_code(), "insufficient_funds");
    assert!(world.prompt.last_quote().is_none());
    assert_eq!(world.balance(&world.alice), dec!(100));
}

#[tokio::test]
async fn test_below_minimum() {
    let world = World::new(dec!(100000), Reply::Accept);
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "50"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Rejected(RejectionReason::AmountTooSmall)));
}

#[tokio::test]
async fn test_self_payment() {
    let world = World::new(dec!(100000), Reply::Accept);
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.alice.clone(), "500"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Rejected(RejectionReason::SelfTransfer)));
}

#[tokio::test]
async fn test_blocked_recipient() {
    let mut world = World::new(dec!(100000), Reply::Accept);
    world.permissions.grant(world.bob.id, permissions::BLOCK_PAYMENTS);
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "500"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Rejected(RejectionReason::RecipientBlocked)));
}

#[tokio::test]
async fn test_decline_does_not_touch_ledger() {
    let world = World::new(dec!(2000), Reply::Decline);
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Declined));
    assert!(err.is_client_error());
    assert_eq!(world.balance(&world.alice), dec!(2000));
    assert_eq!(world.balance(&world.bob), dec!(0));
    assert_eq!(world.pot.contributions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_prompt_expires() {
    let world = World::new(dec!(2000), Reply::Ignore);
    let handler = world.handler_with(Config {
        confirmation_timeout: Duration::from_secs(30),
        ..Config::default()
    });

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConfirmationExpired));
    assert_eq!(handler.gate().pending(), 0);
    assert_eq!(world.balance(&world.alice), dec!(2000));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_payment_withdraws_prompt() {
    let world = World::new(dec!(2000), Reply::Ignore);
    let handler = world.handler_with(Config {
        confirmation_timeout: Duration::from_secs(3600),
        ..Config::default()
    });

    let command = PayCommand::new(world.alice.clone(), world.bob.clone(), "1000");
    let outcome = tokio::time::timeout(Duration::from_secs(5), handler.execute(command)).await;

    assert!(outcome.is_err());
    assert_eq!(handler.gate().pending(), 0);
    assert_eq!(world.balance(&world.alice), dec!(2000));
}

#[tokio::test]
async fn test_unrepresentable_timeout_is_an_error() {
    let world = World::new(dec!(2000), Reply::Accept);
    let handler = world.handler_with(Config {
        confirmation_timeout: Duration::from_secs(10_000_000_000_000),
        ..Config::default()
    });

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Confirmation(ConfirmationError::TimeoutOutOfRange(_))
    ));
    assert_eq!(err.error_code(), "confirmation_timeout_out_of_range");
    assert_eq!(handler.gate().pending(), 0);
    assert_eq!(world.balance(&world.alice), dec!(2000));
}

#[tokio::test]
async fn test_partial_settlement_is_reported() {
    let world = World::new(dec!(2000), Reply::Accept);
    world.ledger.fail_transfers();
    let handler = world.handler();

    let err = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap_err();

    match &err {
        AppError::PartialSettlement {
            tax_debited,
            source,
        } => {
            assert_eq!(*tax_debited, dec!(150));
            assert!(matches!(source, SettlementError::LedgerTransferFailed(_)));
        }
        other => panic!("Expected PartialSettlement, got: {:?}", other),
    }
    assert!(err.needs_compensation());
    assert_eq!(world.balance(&world.alice), dec!(1850));
    assert_eq!(world.balance(&world.bob), dec!(0));
    assert_eq!(world.pot.total(), 0);
}

#[tokio::test]
async fn test_configured_tax_rate_applies() {
    let world = World::new(dec!(2000), Reply::Accept);
    let handler = world.handler_with(Config {
        tax_percentage: dec!(10),
        ..Config::default()
    });

    let receipt = handler
        .execute(PayCommand::new(world.alice.clone(), world.bob.clone(), "1000"))
        .await
        .unwrap();

    assert_eq!(receipt.tax, dec!(100));
    assert_eq!(receipt.lottery_contribution, 10);
    assert_eq!(world.balance(&world.alice), dec!(900));
}
