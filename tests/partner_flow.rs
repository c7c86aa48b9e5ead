use hakedis::error::LedgerError;
use hakedis::models::StatementStatus;
use hakedis::state::{
    check_duplicate_period, close_partner_statement, create_partner, create_partner_statement,
    deactivate_partner, delete_partner_statement, get_partner_by_id,
    get_partner_statement_by_id, list_partner_statements,
    override_partner_statement_previous_balance, partner_statement_exists,
    reopen_partner_statement, update_partner_statement,
};

#[path = "common/mod.rs"]
mod common;

#[tokio::test]
async fn partner_statement_formula_round_trip() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let actor = common::test_actor();

    let partner_id = create_partner(&state, "A. Kaptan", 50.0, 100000.0, &actor)
        .await
        .unwrap();

    let stmt_id = create_partner_statement(
        &state,
        &partner_id,
        1,
        2026,
        33250.0,
        100000.0,
        13972.0,
        160000.0,
        Some(0.0),
        None,
        &actor,
    )
    .await
    .unwrap();

    let stmt = get_partner_statement_by_id(&state, &stmt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stmt.previous_balance, 0.0);
    assert_eq!(stmt.next_month_balance, -12778.0);
    assert_eq!(stmt.status, StatementStatus::Draft);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn previous_balance_chains_from_prior_month() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let actor = common::test_actor();

    let partner_id = create_partner(&state, "B. Usta", 50.0, 80000.0, &actor)
        .await
        .unwrap();

    let jan_id = create_partner_statement(
        &state,
        &partner_id,
        1,
        2026,
        0.0,
        80000.0,
        20000.0,
        50000.0,
        None,
        None,
        &actor,
    )
    .await
    .unwrap();
    let jan = get_partner_statement_by_id(&state, &jan_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(jan.previous_balance, 0.0);
    assert_eq!(jan.next_month_balance, 50000.0);

    close_partner_statement(&state, &jan_id, &actor).await.unwrap();

    let feb_id = create_partner_statement(
        &state,
        &partner_id,
        2,
        2026,
        0.0,
        80000.0,
        0.0,
        100000.0,
        None,
        None,
        &actor,
    )
    .await
    .unwrap();
    let feb = get_partner_statement_by_id(&state, &feb_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(feb.previous_balance, 50000.0);
    assert_eq!(feb.next_month_balance, 30000.0);

    // Privileged override rewrites the chain and re-derives the result.
    override_partner_statement_previous_balance(&state, &feb_id, 10000.0, &actor)
        .await
        .unwrap();
    let feb = get_partner_statement_by_id(&state, &feb_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(feb.previous_balance, 10000.0);
    assert_eq!(feb.next_month_balance, -10000.0);

    let listed = list_partner_statements(&state, &partner_id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].month, 2);
    assert_eq!(listed[1].month, 1);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn duplicate_period_check_is_advisory() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let actor = common::test_actor();

    let partner_id = create_partner(&state, "C. Reis", 25.0, 60000.0, &actor)
        .await
        .unwrap();

    assert!(!partner_statement_exists(&state, &partner_id, 3, 2026).await.unwrap());
    check_duplicate_period(&state, &partner_id, 3, 2026)
        .await
        .unwrap();

    create_partner_statement(
        &state, &partner_id, 3, 2026, 0.0, 60000.0, 0.0, 0.0, None, None, &actor,
    )
    .await
    .unwrap();

    // The check now warns, but creation still succeeds (operator override).
    let err = check_duplicate_period(&state, &partner_id, 3, 2026)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicatePeriod { month: 3, year: 2026, .. }));

    create_partner_statement(
        &state, &partner_id, 3, 2026, 0.0, 60000.0, 0.0, 0.0, None, None, &actor,
    )
    .await
    .unwrap();
    assert_eq!(
        list_partner_statements(&state, &partner_id).await.unwrap().len(),
        2
    );

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn closed_partner_statement_rejects_edits_until_reopened() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let actor = common::test_actor();

    let partner_id = create_partner(&state, "D. Çelik", 25.0, 60000.0, &actor)
        .await
        .unwrap();
    let stmt_id = create_partner_statement(
        &state, &partner_id, 4, 2026, 0.0, 60000.0, 0.0, 0.0, None, None, &actor,
    )
    .await
    .unwrap();

    close_partner_statement(&state, &stmt_id, &actor).await.unwrap();

    let err = update_partner_statement(&state, &stmt_id, 0.0, 60000.0, 0.0, 10000.0, None, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));
    let err = override_partner_statement_previous_balance(&state, &stmt_id, 1.0, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));
    let err = delete_partner_statement(&state, &stmt_id, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    let frozen = get_partner_statement_by_id(&state, &stmt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frozen.next_month_balance, 60000.0);

    reopen_partner_statement(&state, &stmt_id, &actor).await.unwrap();
    update_partner_statement(&state, &stmt_id, 0.0, 60000.0, 0.0, 10000.0, None, &actor)
        .await
        .unwrap();
    let edited = get_partner_statement_by_id(&state, &stmt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.next_month_balance, 50000.0);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn partner_validation_rules() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let actor = common::test_actor();

    let err = create_partner(&state, "", 50.0, 0.0, &actor).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = create_partner(&state, "E. Deniz", 150.0, 0.0, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = create_partner(&state, "E. Deniz", 50.0, -1.0, &actor)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let partner_id = create_partner(&state, "E. Deniz", 50.0, 70000.0, &actor)
        .await
        .unwrap();
    let err = create_partner_statement(
        &state, &partner_id, 13, 2026, 0.0, 0.0, 0.0, 0.0, None, None, &actor,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    deactivate_partner(&state, &partner_id, &actor).await.unwrap();
    let partner = get_partner_by_id(&state, &partner_id).await.unwrap().unwrap();
    assert!(!partner.is_active);

    common::teardown(Some(ctx)).await;
}
