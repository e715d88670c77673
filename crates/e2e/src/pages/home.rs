//! Store home page

use crate::scenario::{Locator, Scenario, TestStep};

/// The product-grid landing page
pub struct HomePage<'a> {
    scenario: &'a mut Scenario,
    sign_in_link: Locator,
    nav_menu: Locator,
    search_input: Locator,
    search_button: Locator,
    grid_links: Locator,
}

impl<'a> HomePage<'a> {
    pub const PATH: &'static str = "/";

    /// Expected document title of the store front
    pub const TITLE: &'static str = "Practice Software Testing - Toolshop - v5.0";

    pub fn new(scenario: &'a mut Scenario) -> Self {
        Self {
            scenario,
            sign_in_link: Locator::test_id("nav-sign-in"),
            nav_menu: Locator::test_id("nav-menu"),
            search_input: Locator::test_id("search-query"),
            search_button: Locator::test_id("search-submit"),
            grid_links: Locator::css(".col-md-9 a"),
        }
    }

    pub fn goto(&mut self) {
        self.scenario.push(TestStep::Navigate {
            url: Self::PATH.to_string(),
            wait_for: Some(self.search_input.clone()),
        });
    }

    /// Follow the sign-in link in the navigation bar
    pub fn open_sign_in(&mut self) {
        self.scenario.push(TestStep::Click {
            target: self.sign_in_link.clone(),
            timeout_ms: None,
        });
    }

    /// Submit a search query through the sidebar form
    pub fn search(&mut self, query: &str) {
        self.scenario.push(TestStep::Fill {
            target: self.search_input.clone(),
            value: query.to_string(),
        });
        self.scenario.push(TestStep::Click {
            target: self.search_button.clone(),
            timeout_ms: None,
        });
    }

    // Assertion emitters

    pub fn expect_title(&mut self) {
        self.scenario.push(TestStep::ExpectTitle {
            title: Self::TITLE.to_string(),
        });
    }

    /// Assert the number of product links in the grid
    pub fn expect_product_count(&mut self, count: usize) {
        self.scenario.push(TestStep::Expect {
            target: self.grid_links.clone(),
            visible: None,
            text: None,
            text_contains: None,
            count: Some(count),
            disabled: None,
        });
    }

    /// Assert a product image is visible by its alt text
    pub fn expect_product_image(&mut self, alt: &str) {
        self.scenario.push(TestStep::Expect {
            target: Locator::AltText(alt.to_string()),
            visible: Some(true),
            text: None,
            text_contains: None,
            count: None,
            disabled: None,
        });
    }

    /// Assert nobody is signed in: the sign-in link reads "Sign in"
    pub fn expect_signed_out(&mut self) {
        self.scenario.push(TestStep::Expect {
            target: self.sign_in_link.clone(),
            visible: None,
            text: Some("Sign in".to_string()),
            text_contains: None,
            count: None,
            disabled: None,
        });
    }

    /// Assert the given display name is signed in: nav menu shows the name
    /// and the sign-in link is gone. Visibility is checked before content so
    /// the text read does not race the menu render.
    pub fn expect_signed_in_as(&mut self, display_name: &str) {
        self.scenario.push(TestStep::Expect {
            target: self.nav_menu.clone(),
            visible: Some(true),
            text: None,
            text_contains: Some(display_name.to_string()),
            count: None,
            disabled: None,
        });
        self.scenario.push(TestStep::Expect {
            target: self.sign_in_link.clone(),
            visible: Some(false),
            text: None,
            text_contains: None,
            count: None,
            disabled: None,
        });
    }
}
