//! Product and checkout flow

use crate::scenario::{Locator, Scenario, TestStep};

/// Billing address for the checkout form
#[derive(Debug, Clone)]
pub struct BillingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// Drives a product from the grid through cart, billing and payment
pub struct CheckoutPage<'a> {
    scenario: &'a mut Scenario,
    add_to_cart: Locator,
    cart_quantity: Locator,
    nav_cart: Locator,
    payment_method: Locator,
    installments: Locator,
    finish_button: Locator,
    status_block: Locator,
}

impl<'a> CheckoutPage<'a> {
    pub fn new(scenario: &'a mut Scenario) -> Self {
        Self {
            scenario,
            add_to_cart: Locator::test_id("add-to-cart"),
            cart_quantity: Locator::test_id("cart-quantity"),
            nav_cart: Locator::test_id("nav-cart"),
            payment_method: Locator::test_id("payment-method"),
            installments: Locator::test_id("monthly_installments"),
            finish_button: Locator::test_id("finish"),
            status_block: Locator::css(".help-block"),
        }
    }

    /// Open a product's detail page from the grid by its name
    pub fn open_product(&mut self, name: &str) {
        self.scenario.push(TestStep::Click {
            target: Locator::Role {
                role: "link".to_string(),
                name: name.to_string(),
            },
            timeout_ms: None,
        });
    }

    pub fn add_to_cart(&mut self) {
        self.scenario.push(TestStep::Click {
            target: self.add_to_cart.clone(),
            timeout_ms: None,
        });
    }

    pub fn expect_cart_quantity(&mut self, quantity: &str) {
        self.scenario.push(TestStep::Expect {
            target: self.cart_quantity.clone(),
            visible: None,
            text: Some(quantity.to_string()),
            text_contains: None,
            count: None,
            disabled: None,
        });
    }

    pub fn open_cart(&mut self) {
        self.scenario.push(TestStep::Click {
            target: self.nav_cart.clone(),
            timeout_ms: None,
        });
    }

    /// Advance the checkout stepper (1 = cart, 2 = sign-in, 3 = billing)
    pub fn proceed(&mut self, step: u8) {
        self.scenario.push(TestStep::Click {
            target: Locator::test_id(format!("proceed-{}", step)),
            timeout_ms: None,
        });
    }

    pub fn fill_billing_address(&mut self, address: &BillingAddress) {
        let fields = [
            ("street", &address.street),
            ("city", &address.city),
            ("state", &address.state),
            ("country", &address.country),
            ("postal_code", &address.postal_code),
        ];
        for (id, value) in fields {
            self.scenario.push(TestStep::Fill {
                target: Locator::test_id(id),
                value: value.clone(),
            });
        }
    }

    /// The finish button stays disabled until a payment method is chosen
    pub fn expect_finish_disabled(&mut self) {
        self.scenario.push(TestStep::Expect {
            target: self.finish_button.clone(),
            visible: None,
            text: None,
            text_contains: None,
            count: None,
            disabled: Some(true),
        });
    }

    pub fn select_payment_method(&mut self, method: &str) {
        self.scenario.push(TestStep::Select {
            target: self.payment_method.clone(),
            value: method.to_string(),
        });
    }

    pub fn select_installments(&mut self, installments: &str) {
        self.scenario.push(TestStep::Select {
            target: self.installments.clone(),
            value: installments.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.scenario.push(TestStep::Click {
            target: self.finish_button.clone(),
            timeout_ms: None,
        });
    }

    /// Assert the final status block text, e.g. "Payment was successful"
    pub fn expect_payment_status(&mut self, status: &str) {
        self.scenario.push(TestStep::Expect {
            target: self.status_block.clone(),
            visible: Some(true),
            text: Some(status.to_string()),
            text_contains: None,
            count: None,
            disabled: None,
        });
    }
}
