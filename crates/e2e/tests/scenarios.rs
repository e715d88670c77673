//! Offline integration tests over the shipped scenario files and the
//! page-object / fixture / codegen layers.

use std::path::{Path, PathBuf};

use toolshop_common::{Credentials, Role, RoleProfile, RunConfig};
use toolshop_e2e::auth;
use toolshop_e2e::browser::{PlaywrightConfig, PlaywrightHandle};
use toolshop_e2e::fixture::AuthenticatedFixture;
use toolshop_e2e::pages::{BillingAddress, CheckoutPage, HomePage};
use toolshop_e2e::scenario::{Locator, Scenario, TestStep};

fn specs_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("specs")
}

fn handle(config: PlaywrightConfig) -> PlaywrightHandle {
    PlaywrightHandle::new(PlaywrightConfig {
        screenshot_dir: std::env::temp_dir(),
        ..config
    })
    .expect("temp screenshot dir is writable")
}

#[test]
fn shipped_scenarios_parse() {
    let scenarios = Scenario::load_all(&specs_dir()).unwrap();
    let names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "account-customer2-signed-in",
            "checkout-pay-later",
            "home-unauthenticated",
            "home-search-thor-hammer",
        ]
    );
}

#[test]
fn account_scenario_runs_under_the_customer2_fixture() {
    let scenario = Scenario::from_file(&specs_dir().join("account.yaml")).unwrap();
    assert_eq!(scenario.role, Some(Role::Customer2));
    assert!(scenario.steps.iter().any(|s| matches!(
        s,
        TestStep::Expect { text_contains: Some(t), .. } if t == "Jack Howe"
    )));
    assert!(scenario.steps.iter().any(|s| matches!(
        s,
        TestStep::Expect {
            target: Locator::TestId(id),
            visible: Some(false),
            ..
        } if id == "nav-sign-in"
    )));
}

#[test]
fn checkout_scenario_orders_payment_before_finish() {
    let scenario = Scenario::from_file(&specs_dir().join("checkout.yaml")).unwrap();
    assert_eq!(scenario.role, Some(Role::Customer1));
    assert!(scenario.visual_regression);

    let position = |pred: &dyn Fn(&TestStep) -> bool| scenario.steps.iter().position(pred);

    let disabled_check = position(&|s| {
        matches!(s, TestStep::Expect { disabled: Some(true), .. })
    })
    .unwrap();
    let payment = position(&|s| {
        matches!(s, TestStep::Select { target: Locator::TestId(id), .. } if id == "payment-method")
    })
    .unwrap();
    let installments = position(&|s| {
        matches!(s, TestStep::Select { target: Locator::TestId(id), .. } if id == "monthly_installments")
    })
    .unwrap();
    let finish = position(&|s| {
        matches!(s, TestStep::Click { target: Locator::TestId(id), .. } if id == "finish")
    })
    .unwrap();
    let status = position(&|s| {
        matches!(s, TestStep::Expect { text: Some(t), .. } if t == "Payment was successful")
    })
    .unwrap();

    assert!(disabled_check < payment);
    assert!(payment < installments);
    assert!(installments < finish);
    assert!(finish < status);
}

#[test]
fn checkout_snapshot_masks_the_rotating_banner() {
    let scenario = Scenario::from_file(&specs_dir().join("checkout.yaml")).unwrap();
    match scenario.steps.last().unwrap() {
        TestStep::Screenshot { name, mask, .. } => {
            assert_eq!(name, "checkout-customer1");
            assert!(!mask.is_empty());
        }
        other => panic!("expected a trailing screenshot, got {:?}", other),
    }
}

#[test]
fn page_objects_reproduce_the_shipped_search_scenario() {
    let shipped = Scenario::from_file(&specs_dir().join("search.yaml")).unwrap();

    let mut built = Scenario::new("home-search-thor-hammer");
    let mut home = HomePage::new(&mut built);
    home.goto();
    home.search("Thor Hammer");
    home.expect_product_count(1);
    home.expect_product_image("Thor Hammer");

    assert_eq!(shipped.steps, built.steps);
}

#[test]
fn checkout_page_objects_build_the_full_flow() {
    let mut scenario = Scenario::new("checkout");
    let mut home = HomePage::new(&mut scenario);
    home.goto();
    home.expect_signed_in_as("Jane Doe");

    let mut checkout = CheckoutPage::new(&mut scenario);
    checkout.open_product("Claw Hammer with Shock Reduction Grip");
    checkout.add_to_cart();
    checkout.expect_cart_quantity("1");
    checkout.open_cart();
    checkout.proceed(1);
    checkout.proceed(2);
    checkout.fill_billing_address(&BillingAddress {
        street: "Pimpelmees 12".to_string(),
        city: "Hoogkarspel".to_string(),
        state: "Noord-Holland".to_string(),
        country: "Netherlands".to_string(),
        postal_code: "1616AA".to_string(),
    });
    checkout.proceed(3);
    checkout.expect_finish_disabled();
    checkout.select_payment_method("Buy Now Pay Later");
    checkout.select_installments("6 Monthly Installments");
    checkout.finish();
    checkout.expect_payment_status("Payment was successful");

    let script = handle(PlaywrightConfig::default()).build_script(&scenario.steps);
    assert!(script.contains(r#"page.getByTestId("add-to-cart")"#));
    assert!(script.contains(r#"selectOption({ label: "Buy Now Pay Later" })"#));
    assert!(script.contains(r#"selectOption({ label: "6 Monthly Installments" })"#));
    assert!(script.contains("Payment was successful"));
}

#[test]
fn provisioning_script_logs_in_then_waits_then_persists() {
    let profile = RoleProfile {
        role: Role::Customer2,
        credentials: Credentials {
            email: "customer2@example.test".to_string(),
            password: "welcome01".to_string(),
        },
        expected_url_suffix: "/account".to_string(),
        expected_marker_text: "My account".to_string(),
    };
    let scenario = auth::setup_scenario(&profile, Path::new("/tmp/auth/customer2.json"));
    let script = handle(PlaywrightConfig::default()).build_script(&scenario.steps);

    let login = script.find(r#"page.getByTestId("login-submit")"#).unwrap();
    let wait = script.find("page.waitForURL").unwrap();
    let marker = script.find("My account").unwrap();
    let save = script.find("context.storageState").unwrap();
    assert!(login < wait);
    assert!(wait < marker);
    assert!(marker < save);
}

#[test]
fn fixture_seeds_generated_scripts_with_session_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RunConfig::default();
    config.auth_dir = dir.path().to_path_buf();

    // Simulate a completed setup run for customer2
    let state: toolshop_common::SessionState = serde_json::from_str(
        r#"{"cookies":[{"name":"t","value":"v","domain":"d","path":"/"}],"origins":[]}"#,
    )
    .unwrap();
    state.save(&config.session_file("customer2")).unwrap();

    let fixture = AuthenticatedFixture::acquire(&config, Role::Customer2).unwrap();
    let pw = fixture.apply(PlaywrightConfig::default());

    let mut scenario = Scenario::new("account");
    let mut home = HomePage::new(&mut scenario);
    home.expect_signed_in_as("Jack Howe");
    fixture.prepare(&mut scenario);

    let script = handle(pw).build_script(&scenario.steps);
    assert!(script.contains("storageState:"));
    assert!(script.contains("customer2.json"));
}

#[test]
fn fixture_failure_carries_the_role_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RunConfig::default();
    config.auth_dir = dir.path().to_path_buf();

    let err = AuthenticatedFixture::acquire(&config, Role::Customer3).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("customer3"));
    assert!(message.contains("customer3.json"));
}
