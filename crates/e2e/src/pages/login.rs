//! Login page

use crate::scenario::{Locator, Scenario, TestStep};

/// The sign-in form at `/auth/login`
pub struct LoginPage<'a> {
    scenario: &'a mut Scenario,
    email_input: Locator,
    password_input: Locator,
    login_button: Locator,
}

impl<'a> LoginPage<'a> {
    /// Canonical path relative to the UI base origin
    pub const PATH: &'static str = "/auth/login";

    pub fn new(scenario: &'a mut Scenario) -> Self {
        Self {
            scenario,
            email_input: Locator::test_id("email"),
            password_input: Locator::test_id("password"),
            login_button: Locator::test_id("login-submit"),
        }
    }

    /// Navigate to the login path; the base origin comes from run config
    pub fn goto(&mut self) {
        self.scenario.push(TestStep::Navigate {
            url: Self::PATH.to_string(),
            wait_for: Some(self.email_input.clone()),
        });
    }

    /// Fill both credential fields and submit. Success verification is the
    /// caller's responsibility.
    pub fn login(&mut self, email: &str, password: &str) {
        self.scenario.push(TestStep::Fill {
            target: self.email_input.clone(),
            value: email.to_string(),
        });
        self.scenario.push(TestStep::Fill {
            target: self.password_input.clone(),
            value: password.to_string(),
        });
        self.scenario.push(TestStep::Click {
            target: self.login_button.clone(),
            timeout_ms: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goto_then_login_emits_the_form_steps() {
        let mut scenario = Scenario::new("login");
        let mut page = LoginPage::new(&mut scenario);
        page.goto();
        page.login("customer2@example.test", "welcome01");

        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[0],
            TestStep::Navigate {
                url: "/auth/login".to_string(),
                wait_for: Some(Locator::test_id("email")),
            }
        );
        assert_eq!(
            scenario.steps[3],
            TestStep::Click {
                target: Locator::test_id("login-submit"),
                timeout_ms: None,
            }
        );
    }

    #[test]
    fn login_does_not_assert_success() {
        let mut scenario = Scenario::new("login");
        let mut page = LoginPage::new(&mut scenario);
        page.login("a@b.test", "pw");
        assert!(scenario
            .steps
            .iter()
            .all(|s| !matches!(s, TestStep::Expect { .. } | TestStep::ExpectTitle { .. })));
    }
}
