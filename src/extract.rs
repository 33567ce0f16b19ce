use log::{debug, info, warn};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::slot::RawSlot;

const USERNAME_INPUT: &str = "#username";
const PASSWORD_INPUT: &str = "#password";
const DASHBOARD_MARKER: &str = "#div_QuickLinks";
const SCHEDULE_LINK_TEXT: &str = "Schedule my drive";
const APPOINTMENT_LINKS: &str = "a#btnSelectAppt";

const ATTR_IDENTIFIER: &str = "data-appointmentdatelongstring";
const ATTR_START: &str = "data-starttime";
const ATTR_END: &str = "data-endtime";
const ATTR_INSTRUCTOR: &str = "data-instructor";

const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);
const SCHEDULE_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to obtain the slot list from the site
#[derive(Debug)]
pub enum ExtractionError {
    /// Request failed or returned an error status
    Http(reqwest::Error),
    /// Request did not complete within its time budget
    Timeout(String),
    /// Login did not reach the signed-in dashboard
    Authentication(String),
    /// An element the navigation depends on is absent
    ElementNotFound(String),
    /// A link or form action could not be resolved
    InvalidUrl(String, url::ParseError),
    /// CSS selector failed to parse
    Selector(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Http(err) => write!(f, "HTTP error: {}", err),
            ExtractionError::Timeout(url) => write!(f, "Timed out waiting for {}", url),
            ExtractionError::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            ExtractionError::ElementNotFound(what) => write!(f, "Element not found: {}", what),
            ExtractionError::InvalidUrl(raw, err) => write!(f, "Invalid URL '{}': {}", raw, err),
            ExtractionError::Selector(msg) => write!(f, "Invalid selector: {}", msg),
        }
    }
}

impl StdError for ExtractionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ExtractionError::Http(err) => Some(err),
            ExtractionError::InvalidUrl(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "request".to_string());
            ExtractionError::Timeout(url)
        } else {
            ExtractionError::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Source of raw slot records for one cycle
pub trait Extractor {
    fn extract(&mut self) -> Result<Vec<RawSlot>>;
}

/// Logs in to the booking site over HTTP and reads the open appointments
///
/// Every call starts a fresh cookie session that is dropped when the call returns.
pub struct SiteExtractor {
    login_url: Url,
    username: String,
    password: String,
}

impl SiteExtractor {
    pub fn new(login_url: Url, username: String, password: String) -> Self {
        Self {
            login_url,
            username,
            password,
        }
    }

    fn session() -> Result<Client> {
        Ok(Client::builder()
            .cookie_store(true)
            .connect_timeout(LOGIN_TIMEOUT)
            .build()?)
    }

    fn login(&self, client: &Client) -> Result<(Url, String)> {
        info!("Opening login page: {}", self.login_url);
        let response = client
            .get(self.login_url.clone())
            .timeout(LOGIN_TIMEOUT)
            .send()?
            .error_for_status()?;
        let page_url = response.url().clone();
        let html = response.text()?;

        let form = find_login_form(&html, &page_url)?;
        let mut fields = form.hidden_fields;
        fields.push((form.username_field, self.username.clone()));
        fields.push((form.password_field, self.password.clone()));

        let response = client
            .post(form.action)
            .form(&fields)
            .timeout(LOGIN_TIMEOUT)
            .send()?
            .error_for_status()?;
        let dashboard_url = response.url().clone();
        let html = response.text()?;

        if !has_element(&html, DASHBOARD_MARKER)? {
            return Err(ExtractionError::Authentication(format!(
                "{} missing after login (landed on {})",
                DASHBOARD_MARKER, dashboard_url
            )));
        }
        info!("Login completed.");
        Ok((dashboard_url, html))
    }
}

impl Extractor for SiteExtractor {
    fn extract(&mut self) -> Result<Vec<RawSlot>> {
        let client = Self::session()?;
        let (dashboard_url, dashboard) = self.login(&client)?;

        let schedule_url = find_link_by_text(&dashboard, &dashboard_url, SCHEDULE_LINK_TEXT)?;
        let html = client
            .get(schedule_url)
            .timeout(SCHEDULE_TIMEOUT)
            .send()?
            .error_for_status()?
            .text()?;
        info!("Navigated to '{}' page.", SCHEDULE_LINK_TEXT);

        let slots = parse_appointments(&html)?;
        info!("Found {} listed appointments", slots.len());
        Ok(slots)
    }
}

/// Where and how to submit the login form
#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub action: Url,
    pub username_field: String,
    pub password_field: String,
    pub hidden_fields: Vec<(String, String)>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("{}: {:?}", css, e)))
}

fn has_element(html: &str, css: &str) -> Result<bool> {
    let document = Html::parse_document(html);
    let sel = selector(css)?;
    let found = document.select(&sel).next().is_some();
    Ok(found)
}

fn resolve(base: &Url, href: &str) -> Result<Url> {
    base.join(href)
        .map_err(|e| ExtractionError::InvalidUrl(href.to_string(), e))
}

/// Locate the form holding the username and password inputs
pub fn find_login_form(html: &str, page_url: &Url) -> Result<LoginForm> {
    let document = Html::parse_document(html);
    let form_sel = selector("form")?;
    let user_sel = selector(USERNAME_INPUT)?;
    let pass_sel = selector(PASSWORD_INPUT)?;
    let hidden_sel = selector("input[type=hidden]")?;

    for form in document.select(&form_sel) {
        let (Some(user), Some(pass)) = (
            form.select(&user_sel).next(),
            form.select(&pass_sel).next(),
        ) else {
            continue;
        };

        let action = match form.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => resolve(page_url, action)?,
            _ => page_url.clone(),
        };
        let hidden_fields = form
            .select(&hidden_sel)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                let value = input.value().attr("value").unwrap_or("");
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        return Ok(LoginForm {
            action,
            username_field: input_name(&user, "username"),
            password_field: input_name(&pass, "password"),
            hidden_fields,
        });
    }

    Err(ExtractionError::ElementNotFound(format!(
        "login form with {} and {}",
        USERNAME_INPUT, PASSWORD_INPUT
    )))
}

fn input_name(input: &ElementRef<'_>, fallback: &str) -> String {
    input
        .value()
        .attr("name")
        .unwrap_or(fallback)
        .to_string()
}

/// Resolve the href of the first link whose text contains `text`
pub fn find_link_by_text(html: &str, page_url: &Url, text: &str) -> Result<Url> {
    let document = Html::parse_document(html);
    let link_sel = selector("a[href]")?;
    let href = document
        .select(&link_sel)
        .find(|a| a.text().collect::<String>().contains(text))
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ExtractionError::ElementNotFound(format!("link '{}'", text)))?;
    resolve(page_url, href)
}

/// Read every appointment button on the scheduling page, in page order
pub fn parse_appointments(html: &str) -> Result<Vec<RawSlot>> {
    let document = Html::parse_document(html);
    let sel = selector(APPOINTMENT_LINKS)?;
    let mut slots = Vec::new();

    for element in document.select(&sel) {
        let attrs = element.value();
        let Some(identifier) = attrs.attr(ATTR_IDENTIFIER).map(str::trim).filter(|s| !s.is_empty())
        else {
            warn!("Appointment element without {}; skipping", ATTR_IDENTIFIER);
            continue;
        };
        let slot = RawSlot::from_site(
            identifier,
            attrs.attr(ATTR_START).unwrap_or("").trim(),
            attrs.attr(ATTR_END).unwrap_or("").trim(),
            attrs.attr(ATTR_INSTRUCTOR).unwrap_or("").trim(),
        );
        debug!("Listed: {:?}", slot);
        slots.push(slot);
    }

    Ok(slots)
}
