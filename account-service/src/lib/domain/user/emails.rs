use crate::domain::user::models::User;

/// A plain-text transactional email, ready for a [`Mailer`](crate::user::ports::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text_body: String,
    /// Link the recipient must follow (carries the token)
    pub action_link: String,
}

impl EmailMessage {
    pub fn activation(user: &User, action_link: String) -> Self {
        Self {
            to: user.email.as_str().to_string(),
            to_name: Some(user.username.as_str().to_string()),
            subject: "Activate your account".to_string(),
            text_body: format!(
                "Hi {},\n\nPlease follow the link below to activate your account:\n\n{}\n\n\
                 If you did not create an account, you can ignore this email.\n",
                user.username, action_link
            ),
            action_link,
        }
    }

    pub fn password_reset(user: &User, action_link: String) -> Self {
        Self {
            to: user.email.as_str().to_string(),
            to_name: Some(user.username.as_str().to_string()),
            subject: "Reset your password".to_string(),
            text_body: format!(
                "Hi {},\n\nA password reset was requested for your account. \
                 Follow the link below to choose a new password:\n\n{}\n\n\
                 If you did not request this, you can ignore this email.\n",
                user.username, action_link
            ),
            action_link,
        }
    }
}

/// Builds the public links embedded in emails.
///
/// Activation links hit the API directly. Reset links need a page that asks
/// for the new password; until one is configured they carry the API route,
/// which only accepts `PUT`.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
    password_reset_page: Option<String>,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_slash(base_url.into()),
            password_reset_page: None,
        }
    }

    pub fn with_password_reset_page(mut self, page_url: impl Into<String>) -> Self {
        self.password_reset_page = Some(trim_slash(page_url.into()));
        self
    }

    pub fn activation(&self, token: &str) -> String {
        format!("{}/api/users/activate/{}", self.base_url, token)
    }

    pub fn password_reset(&self, token: &str) -> String {
        match &self.password_reset_page {
            Some(page) => format!("{}/{}", page, token),
            None => format!("{}/api/users/password/reset/{}", self.base_url, token),
        }
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
