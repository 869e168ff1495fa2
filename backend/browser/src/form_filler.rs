//! Online check-in form automation.
//!
//! Drives a headless Chromium instance over CDP: navigate to the check-in
//! page, fill the guest fields the PMS form exposes, submit, and capture a
//! full-page screenshot as evidence. Individual field failures are logged
//! and skipped so one renamed selector does not sink the whole form.

use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{info, warn};

use innkeep_core::time::format_date;
use innkeep_core::{Gender, GuestProfile};

use crate::checkin_url;

/// Outcome of one form-fill run.
#[derive(Debug)]
pub struct FillReport {
    pub fields_filled: u32,
    pub submitted: bool,
    pub screenshot: Option<Vec<u8>>,
}

pub struct FormFiller {
    property_slug: String,
}

impl FormFiller {
    pub fn new(property_slug: &str) -> Self {
        Self { property_slug: property_slug.to_string() }
    }

    /// Fill and submit the online check-in form for one guest.
    pub async fn fill(&self, url: &str, guest: &GuestProfile) -> Result<FillReport> {
        let form_url = checkin_url::expand(url, &self.property_slug);
        info!(url = %form_url, "Filling online check-in form");

        let config = BrowserConfig::builder()
            .new_headless_mode()
            .window_size(1280, 900)
            .args(vec!["--disable-gpu", "--no-first-run", "--lang=hr-HR"])
            .build()
            .map_err(|e| anyhow::anyhow!("chromium configuration failed: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("launch headless chromium")?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let result = self.fill_on_page(&browser, &form_url, guest).await;

        browser.close().await.ok();
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }

    async fn fill_on_page(
        &self,
        browser: &Browser,
        form_url: &str,
        guest: &GuestProfile,
    ) -> Result<FillReport> {
        let page = browser.new_page(form_url).await.context("open check-in page")?;
        page.wait_for_navigation().await.ok();
        sleep(Duration::from_millis(2000)).await;

        let mut filled = 0u32;

        if let Some(name) = guest.display_name() {
            filled += fill_input(
                &page,
                r#"input[placeholder="Unesite ime i prezime"]"#,
                &name.to_uppercase(),
            )
            .await as u32;
        }

        if let Some(birth) = guest.birth_date {
            filled += fill_input(
                &page,
                r#"input[placeholder="Unesite datum (DD.MM.GGGG)"]"#,
                &format_date(birth),
            )
            .await as u32;
        }

        if let Some(gender) = guest.gender {
            let option = match gender {
                Gender::Female => "Ženski",
                Gender::Male => "Muški",
            };
            filled += pick_dropdown(&page, "-- odaberite spol --", option).await as u32;
        }

        // Document type defaults to the national ID card; passports are rare
        // enough that the operator corrects them in the PMS.
        filled += pick_dropdown(&page, "-- odaberite tip dokumenta --", "Osobna iskaznica")
            .await as u32;

        if let Some(number) = &guest.document_number {
            filled += fill_input(
                &page,
                r#"input[placeholder="Unesite broj dokumenta"]"#,
                number,
            )
            .await as u32;
        }

        if let Some(city) = &guest.city_of_residence {
            filled += fill_input(
                &page,
                r#"input[placeholder="Unesite mjesto prebivališta"]"#,
                &city.to_uppercase(),
            )
            .await as u32;
        }

        if let Some(nationality) = &guest.nationality {
            filled += pick_country(&page, nationality).await as u32;
        }

        let submitted = submit(&page).await;

        page.evaluate("window.scrollTo(0, 0)").await.ok();
        sleep(Duration::from_millis(500)).await;
        let screenshot = page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .ok();

        info!(filled, submitted, "Check-in form run finished");
        Ok(FillReport { fields_filled: filled, submitted, screenshot })
    }
}

/// Fill a text input located by CSS selector. Returns whether it succeeded.
async fn fill_input(page: &Page, selector: &str, value: &str) -> bool {
    let result: Result<()> = async {
        let input = page.find_element(selector).await?;
        input.click().await?;
        // Replace any prefilled content.
        input.press_key("Control+a").await?;
        input.type_str(value).await?;
        Ok(())
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(selector, error = %e, "Could not fill input");
            false
        }
    }
}

/// Open a custom dropdown by its placeholder text and click an option.
async fn pick_dropdown(page: &Page, placeholder: &str, option: &str) -> bool {
    let result: Result<()> = async {
        let trigger = page
            .find_xpath(format!("//*[normalize-space(text())='{placeholder}']"))
            .await?;
        trigger.click().await?;
        sleep(Duration::from_millis(300)).await;

        match page
            .find_xpath(format!("//*[normalize-space(text())='{option}']"))
            .await
        {
            Ok(item) => {
                item.click().await?;
            }
            Err(_) => {
                // Close the dropdown again rather than leaving it open.
                trigger.press_key("Escape").await?;
                anyhow::bail!("option '{option}' not present");
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(placeholder, option, error = %e, "Could not drive dropdown");
            false
        }
    }
}

/// The country-of-birth dropdown is searchable: type a prefix, then click
/// the matching entry, falling back to keyboard selection.
async fn pick_country(page: &Page, nationality: &str) -> bool {
    let (search_term, display_name) = country_search_term(nationality);
    let result: Result<()> = async {
        let input = page
            .find_element(r#"input[placeholder="-- odaberite državu rođenja --"]"#)
            .await?;
        input.click().await?;
        sleep(Duration::from_millis(300)).await;
        input.type_str(&search_term).await?;
        sleep(Duration::from_millis(800)).await;

        match page
            .find_xpath(format!("//*[contains(normalize-space(text()), '{display_name}')]"))
            .await
        {
            Ok(option) => {
                option.click().await?;
            }
            Err(_) => {
                input.press_key("ArrowDown").await?;
                sleep(Duration::from_millis(200)).await;
                input.press_key("Enter").await?;
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(nationality, error = %e, "Could not select country");
            false
        }
    }
}

async fn submit(page: &Page) -> bool {
    let result: Result<bool> = async {
        page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .ok();
        sleep(Duration::from_millis(500)).await;

        let button = page
            .find_xpath("//*[normalize-space(text())='Spremi goste']")
            .await
            .context("submit button not found")?;
        button.scroll_into_view().await.ok();
        button.click().await?;
        sleep(Duration::from_millis(2000)).await;

        // The form reports validation problems in a fixed banner.
        let has_error = page
            .find_xpath("//*[contains(text(), 'Obrazac ima pogreške')]")
            .await
            .is_ok();
        Ok(!has_error)
    }
    .await;

    match result {
        Ok(submitted) => submitted,
        Err(e) => {
            warn!(error = %e, "Could not submit check-in form");
            false
        }
    }
}

/// Search prefix and expected dropdown label for a nationality. The
/// dropdown lists countries as "English (native)".
fn country_search_term(nationality: &str) -> (String, String) {
    let known: &[(&str, &str, &str)] = &[
        ("croatia", "Cro", "Croatia (Hrvatska)"),
        ("hrvatska", "Cro", "Croatia (Hrvatska)"),
        ("germany", "Germ", "Germany (Njemačka)"),
        ("austria", "Aust", "Austria (Austrija)"),
        ("slovenia", "Slov", "Slovenia (Slovenija)"),
        ("serbia", "Serb", "Serbia (Srbija)"),
        ("italy", "Ital", "Italy (Italija)"),
        ("hungary", "Hung", "Hungary (Mađarska)"),
        ("bosnia and herzegovina", "Bosn", "Bosnia and Herzegovina"),
    ];
    let lower = nationality.to_lowercase();
    for (name, term, display) in known {
        if lower == *name {
            return (term.to_string(), display.to_string());
        }
    }
    let prefix: String = nationality.chars().take(4).collect();
    (prefix, nationality.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_country_gets_bilingual_label() {
        let (term, display) = country_search_term("Croatia");
        assert_eq!(term, "Cro");
        assert_eq!(display, "Croatia (Hrvatska)");
    }

    #[test]
    fn unknown_country_uses_prefix() {
        let (term, display) = country_search_term("Elbonia");
        assert_eq!(term, "Elbo");
        assert_eq!(display, "Elbonia");
    }
}
