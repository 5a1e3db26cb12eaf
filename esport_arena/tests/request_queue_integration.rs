//! Deposit and withdraw requests through their admin approvals.

mod common;

use common::Arena;
use esport_arena::requests::{
    AddRequestStatus, ApprovalOutcome, DepositForm, PayoutOutcome, RequestError, WithdrawForm,
    WithdrawStatus,
};
use esport_arena::wallet::{EntryType, WalletKind};
use rust_decimal_macros::dec;

fn deposit(amount: rust_decimal::Decimal) -> DepositForm {
    DepositForm {
        amount,
        upi_id: " player@upi ".to_string(),
        txn_id: "T2610161200".to_string(),
    }
}

fn withdrawal(amount: rust_decimal::Decimal) -> WithdrawForm {
    WithdrawForm {
        amount,
        upi_id: "player@upi".to_string(),
    }
}

#[tokio::test]
async fn test_deposit_approved_once() {
    let arena = Arena::new();
    let admin = arena.admin().await;
    let (_, a) = arena.player("a@arena.in").await;

    let request = arena.requests.submit_deposit(&a, deposit(dec!(200))).await.unwrap();
    assert_eq!(request.status, AddRequestStatus::Pending);
    assert_eq!(request.upi_id, "player@upi");
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().added, dec!(0));

    let outcome = arena.requests.approve_add(&admin, request.id).await.unwrap();
    assert!(matches!(outcome, ApprovalOutcome::Approved(_)));
    assert_eq!(outcome.request().status, AddRequestStatus::Approved);
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().added, dec!(200));

    let again = arena.requests.approve_add(&admin, request.id).await.unwrap();
    assert!(matches!(again, ApprovalOutcome::AlreadyApproved(_)));
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().added, dec!(200));

    let entries = arena.wallet.entries(a.user_id(), 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, EntryType::Deposit);
    assert_eq!(entries[0].wallet, WalletKind::Added);
}

#[tokio::test]
async fn test_deposit_beyond_wallet_limit() {
    let arena = Arena::new();
    let admin = arena.admin().await;
    let (_, a) = arena.player("a@arena.in").await;

    let err = arena
        .requests
        .submit_deposit(&a, deposit(dec!(10000000000)))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::AmountTooLarge));
    assert!(arena.requests.user_requests(&a).await.unwrap().add_requests.is_empty());

    let first = arena.requests.submit_deposit(&a, deposit(dec!(9000000000))).await.unwrap();
    let second = arena.requests.submit_deposit(&a, deposit(dec!(1000000000))).await.unwrap();
    arena.requests.approve_add(&admin, first.id).await.unwrap();

    let err = arena.requests.approve_add(&admin, second.id).await.unwrap_err();
    assert!(matches!(err, RequestError::BalanceLimit));
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().added, dec!(9000000000));

    let queue = arena.requests.user_requests(&a).await.unwrap();
    let pending = queue.add_requests.iter().find(|r| r.id == second.id).unwrap();
    assert_eq!(pending.status, AddRequestStatus::Pending);
}

#[tokio::test]
async fn test_non_positive_deposit_rejected() {
    let arena = Arena::new();
    let (_, a) = arena.player("a@arena.in").await;

    for amount in [dec!(0), dec!(-10), dec!(0.004)] {
        let err = arena.requests.submit_deposit(&a, deposit(amount)).await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidAmount));
        assert_eq!(err.client_message(), "Amount must be positive.");
    }
    assert!(arena.requests.user_requests(&a).await.unwrap().add_requests.is_empty());
}

#[tokio::test]
async fn test_withdraw_above_winning_balance_creates_nothing() {
    let arena = Arena::new();
    let (_, a) = arena.player("a@arena.in").await;
    arena.fund(&a, WalletKind::Winning, dec!(300)).await;
    arena.fund(&a, WalletKind::Added, dec!(1000)).await;

    let err = arena.requests.submit_withdraw(&a, withdrawal(dec!(500))).await.unwrap_err();
    assert!(matches!(err, RequestError::ExceedsWinningBalance));
    assert_eq!(
        err.client_message(),
        "Winning balance se zyada withdraw nahi kar sakte."
    );

    let err = arena.requests.submit_withdraw(&a, withdrawal(dec!(0))).await.unwrap_err();
    assert!(matches!(err, RequestError::ExceedsWinningBalance));

    assert!(arena.requests.user_requests(&a).await.unwrap().withdraw_requests.is_empty());
}

#[tokio::test]
async fn test_withdraw_paid_once() {
    let arena = Arena::new();
    let admin = arena.admin().await;
    let (_, a) = arena.player("a@arena.in").await;
    arena.fund(&a, WalletKind::Winning, dec!(300)).await;

    let request = arena.requests.submit_withdraw(&a, withdrawal(dec!(120))).await.unwrap();
    assert_eq!(request.status, WithdrawStatus::Pending);
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().winning, dec!(300));

    let outcome = arena.requests.approve_withdraw(&admin, request.id).await.unwrap();
    assert!(matches!(outcome, PayoutOutcome::Paid(_)));
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().winning, dec!(180));

    let again = arena.requests.approve_withdraw(&admin, request.id).await.unwrap();
    assert!(matches!(again, PayoutOutcome::AlreadyPaid(_)));
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().winning, dec!(180));

    let entries = arena.wallet.entries(a.user_id(), 10).await.unwrap();
    assert_eq!(entries[0].entry_type, EntryType::Withdrawal);
    assert_eq!(entries[0].amount, dec!(-120));
}

#[tokio::test]
async fn test_withdraw_left_pending_when_balance_dropped() {
    let arena = Arena::new();
    let admin = arena.admin().await;
    let t = arena.tournament(&admin, 4, dec!(250)).await;
    let (_, a) = arena.player("a@arena.in").await;
    arena.fund(&a, WalletKind::Winning, dec!(300)).await;

    let request = arena.requests.submit_withdraw(&a, withdrawal(dec!(200))).await.unwrap();
    arena
        .tournaments
        .join(&a, t.id, common::join_request(1, "winning"))
        .await
        .unwrap();

    let outcome = arena.requests.approve_withdraw(&admin, request.id).await.unwrap();
    match outcome {
        PayoutOutcome::InsufficientBalance { request, available } => {
            assert_eq!(available, dec!(50));
            assert_eq!(request.status, WithdrawStatus::Pending);
        }
        other => panic!("unexpected {other:?}"),
    }

    let queue = arena.requests.user_requests(&a).await.unwrap();
    assert_eq!(queue.withdraw_requests[0].status, WithdrawStatus::Pending);
    assert_eq!(arena.wallet.balances(a.user_id()).await.unwrap().winning, dec!(50));
}

#[tokio::test]
async fn test_queues_are_scoped_and_newest_first() {
    let arena = Arena::new();
    let admin = arena.admin().await;
    let (_, a) = arena.player("a@arena.in").await;
    let (_, b) = arena.player("b@arena.in").await;

    let first = arena.requests.submit_deposit(&a, deposit(dec!(10))).await.unwrap();
    let second = arena.requests.submit_deposit(&a, deposit(dec!(20))).await.unwrap();
    arena.requests.submit_deposit(&b, deposit(dec!(30))).await.unwrap();

    let own = arena.requests.user_requests(&a).await.unwrap();
    let ids: Vec<_> = own.add_requests.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let all = arena.requests.all_requests(&admin).await.unwrap();
    assert_eq!(all.add_requests.len(), 3);
    assert!(all.withdraw_requests.is_empty());
}

#[tokio::test]
async fn test_unknown_request_ids() {
    let arena = Arena::new();
    let admin = arena.admin().await;

    let err = arena.requests.approve_add(&admin, 404).await.unwrap_err();
    assert!(err.is_not_found());
    let err = arena.requests.approve_withdraw(&admin, 404).await.unwrap_err();
    assert_eq!(err.client_message(), "Request not found.");
}
