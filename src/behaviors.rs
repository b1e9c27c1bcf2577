use unicode_normalization::UnicodeNormalization;

use crate::dom::{Dom, NodeId};
use crate::dom_utils::encode_bytes_to_base64;
use crate::page::{CartPending, Page, PageTask};
use crate::Result;

pub const DEFAULT_DELETE_PROMPT: &str = "Are you sure you want to delete this item?";

/// Seam for the third-party alert component: the page hands it the alert
/// element and the widget decides how closing looks.
pub trait AlertWidget {
    fn close(&self, alert: AlertElement<'_>) -> Result<()>;
}

/// Mutable handle on one alert element, passed to [`AlertWidget::close`].
pub struct AlertElement<'a> {
    dom: &'a mut Dom,
    node: NodeId,
}

impl<'a> AlertElement<'a> {
    pub(crate) fn new(dom: &'a mut Dom, node: NodeId) -> Self {
        Self { dom, node }
    }

    pub fn text(&self) -> String {
        self.dom.text_content(self.node)
    }

    pub fn add_class(&mut self, class_name: &str) -> Result<()> {
        self.dom.class_add(self.node, class_name)
    }

    pub fn remove_class(&mut self, class_name: &str) -> Result<()> {
        self.dom.class_remove(self.node, class_name)
    }

    pub fn set_style(&mut self, property: &str, value: &str) -> Result<()> {
        self.dom.style_set(self.node, property, value)
    }

    /// Detaches the alert from the document.
    pub fn remove(self) -> Result<()> {
        self.dom.remove_node(self.node)
    }
}

/// Default widget: closing an alert removes it from the tree.
pub struct RemoveOnClose;

impl AlertWidget for RemoveOnClose {
    fn close(&self, alert: AlertElement<'_>) -> Result<()> {
        alert.remove()
    }
}

/// Event-driven behaviors bound to concrete nodes at install time.
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    RatingStar { index: usize, config: RatingWidget },
    SearchInput { config: SearchFilter },
}

impl Behavior {
    pub(crate) fn run(&self, page: &mut Page, target: NodeId) -> Result<()> {
        match self {
            Self::RatingStar { index, config } => config.select(page, *index),
            Self::SearchInput { config } => {
                let query = page.dom.value(target)?;
                config.apply(page, &query)
            }
        }
    }
}

/// Schedules one dismissal per alert present at install time. Alerts inserted
/// later are not covered; no observer is installed.
#[derive(Debug, Clone)]
pub struct AlertAutoDismiss {
    pub selector: String,
    pub delay_ms: i64,
}

impl Default for AlertAutoDismiss {
    fn default() -> Self {
        Self {
            selector: ".alert".to_string(),
            delay_ms: 5000,
        }
    }
}

impl AlertAutoDismiss {
    pub fn install(&self, page: &mut Page) -> Result<()> {
        let alerts = page.dom.query_selector_all(&self.selector)?;
        for alert in alerts {
            page.schedule_task(self.delay_ms, PageTask::CloseAlert { target: alert });
        }
        Ok(())
    }
}

/// Blocking yes/no prompt gating a destructive action. The caller decides
/// what a `true` answer permits.
pub fn confirm_delete(page: &mut Page, message: Option<&str>) -> bool {
    page.confirm(message.unwrap_or(DEFAULT_DELETE_PROMPT))
}

/// "Added!" feedback on a cart button with a delayed revert. Re-invoking
/// while a revert is pending replaces the pending timer and keeps the label
/// captured at the first invocation, so the feedback text can never be
/// restored as the "original" label.
#[derive(Debug, Clone)]
pub struct CartFeedback {
    pub added_label: String,
    pub success_class: String,
    pub revert_after_ms: i64,
}

impl Default for CartFeedback {
    fn default() -> Self {
        Self {
            added_label: "Added!".to_string(),
            success_class: "btn-success".to_string(),
            revert_after_ms: 2000,
        }
    }
}

impl CartFeedback {
    pub fn add_to_cart(&self, page: &mut Page, selector: &str) -> Result<()> {
        let Some(target) = page.dom.query_selector(selector)? else {
            return Ok(());
        };

        let original_label = match page.cart_pending.get(&target) {
            Some(pending) => {
                let timer_id = pending.timer_id;
                let label = pending.original_label.clone();
                page.clear_timer(timer_id);
                label
            }
            None => page.dom.text_content(target),
        };

        page.dom.set_text_content(target, &self.added_label)?;
        page.dom.class_add(target, &self.success_class)?;
        page.dom.set_disabled(target, true)?;

        let timer_id = page.schedule_task(
            self.revert_after_ms,
            PageTask::RevertCartButton {
                target,
                original_label: original_label.clone(),
                success_class: self.success_class.clone(),
            },
        );
        page.cart_pending.insert(
            target,
            CartPending {
                timer_id,
                original_label,
            },
        );
        Ok(())
    }
}

/// Shows the selected upload on a preview image. The read completes
/// asynchronously as a scheduled task; the preview element picks up the data
/// URL when it fires.
#[derive(Debug, Clone)]
pub struct ImagePreview {
    pub preview_id: String,
    pub read_latency_ms: i64,
}

impl Default for ImagePreview {
    fn default() -> Self {
        Self {
            preview_id: "image-preview".to_string(),
            read_latency_ms: 0,
        }
    }
}

impl ImagePreview {
    pub fn preview(&self, page: &mut Page, input_selector: &str) -> Result<()> {
        let Some(input) = page.dom.query_selector(input_selector)? else {
            return Ok(());
        };

        let files = page.files_for(input);
        let [file] = files else {
            return Ok(());
        };

        let Some(preview) = page.dom.by_id(&self.preview_id) else {
            return Ok(());
        };

        let data_url = format!(
            "data:{};base64,{}",
            file.media_type,
            encode_bytes_to_base64(&file.bytes)
        );
        page.schedule_task(
            self.read_latency_ms,
            PageTask::DeliverFilePreview { preview, data_url },
        );
        Ok(())
    }
}

/// Client-side product filtering: case-insensitive, NFKC-folded substring
/// match against each card's name, optionally also its description (the
/// server search matches either).
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub input_selector: String,
    pub card_selector: String,
    pub name_selector: String,
    pub description_selector: Option<String>,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            input_selector: "#product-search".to_string(),
            card_selector: ".product-card".to_string(),
            name_selector: ".product-name".to_string(),
            description_selector: None,
        }
    }
}

impl SearchFilter {
    /// Binds the filter to input events on the configured search box.
    pub fn install(&self, page: &mut Page) -> Result<()> {
        let Some(input) = page.dom.query_selector(&self.input_selector)? else {
            return Ok(());
        };
        page.add_listener(
            input,
            "input",
            Behavior::SearchInput {
                config: self.clone(),
            },
        );
        Ok(())
    }

    /// Recomputes visibility of every card from scratch for `query`.
    pub fn apply(&self, page: &mut Page, query: &str) -> Result<()> {
        let needle = normalize_search_text(query);
        let cards = page.dom.query_selector_all(&self.card_selector)?;

        for card in cards {
            let mut haystack = self.card_field_text(page, card, &self.name_selector)?;
            if let Some(description_selector) = &self.description_selector {
                haystack.push('\n');
                haystack.push_str(&self.card_field_text(page, card, description_selector)?);
            }

            let display = if haystack.contains(&needle) {
                "block"
            } else {
                "none"
            };
            page.dom.style_set(card, "display", display)?;
        }
        Ok(())
    }

    fn card_field_text(&self, page: &Page, card: NodeId, selector: &str) -> Result<String> {
        Ok(page
            .dom
            .query_selector_from(card, selector)?
            .map(|field| normalize_search_text(&page.dom.text_content(field)))
            .unwrap_or_default())
    }
}

fn normalize_search_text(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Integer clamp for quantity inputs. Values below `min` (and unparsable
/// input) clamp to `min`; values above the per-call `max` clamp to `max` and
/// raise a blocking notice naming the maximum. A digit string too large for
/// `i64` counts as above the maximum.
#[derive(Debug, Clone)]
pub struct QuantityClamp {
    pub min: i64,
}

impl Default for QuantityClamp {
    fn default() -> Self {
        Self { min: 1 }
    }
}

impl QuantityClamp {
    pub fn validate(&self, page: &mut Page, selector: &str, max: i64) -> Result<()> {
        let Some(target) = page.dom.query_selector(selector)? else {
            return Ok(());
        };

        let raw = page.dom.value(target)?;
        let trimmed = raw.trim();

        match trimmed.parse::<i64>() {
            Ok(value) if value < self.min => {
                page.dom.set_value(target, &self.min.to_string())?;
            }
            Ok(value) if value > max => {
                page.dom.set_value(target, &max.to_string())?;
                page.show_alert(&format!("Maximum available quantity is {max}"));
            }
            Ok(_) => {}
            Err(_) if is_positive_digit_overflow(trimmed) => {
                page.dom.set_value(target, &max.to_string())?;
                page.show_alert(&format!("Maximum available quantity is {max}"));
            }
            Err(_) => {
                page.dom.set_value(target, &self.min.to_string())?;
            }
        }
        Ok(())
    }
}

// True only for digit strings that failed `i64` parsing, i.e. overflow.
fn is_positive_digit_overflow(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Click-to-rate star row writing a 1-based rating into a hidden field.
#[derive(Debug, Clone)]
pub struct RatingWidget {
    pub star_selector: String,
    pub rating_input: String,
    pub solid_class: String,
    pub outline_class: String,
    pub max_stars: usize,
}

impl Default for RatingWidget {
    fn default() -> Self {
        Self {
            star_selector: ".rating-star".to_string(),
            rating_input: "#rating-input".to_string(),
            solid_class: "fas".to_string(),
            outline_class: "far".to_string(),
            max_stars: 5,
        }
    }
}

impl RatingWidget {
    pub fn install(&self, page: &mut Page) -> Result<()> {
        let mut stars = page.dom.query_selector_all(&self.star_selector)?;
        stars.truncate(self.max_stars);
        for (index, star) in stars.into_iter().enumerate() {
            page.add_listener(
                star,
                "click",
                Behavior::RatingStar {
                    index,
                    config: self.clone(),
                },
            );
        }
        Ok(())
    }

    /// Applies the selection for a click on the star at `index` (0-based):
    /// stars up to and including it go solid, the rest go outline.
    pub fn select(&self, page: &mut Page, index: usize) -> Result<()> {
        let rating = index + 1;

        if let Some(input) = page.dom.query_selector(&self.rating_input)? {
            page.dom.set_value(input, &rating.to_string())?;
        }

        let mut stars = page.dom.query_selector_all(&self.star_selector)?;
        stars.truncate(self.max_stars);
        for (i, star) in stars.into_iter().enumerate() {
            if i < rating {
                page.dom.class_remove(star, &self.outline_class)?;
                page.dom.class_add(star, &self.solid_class)?;
            } else {
                page.dom.class_remove(star, &self.solid_class)?;
                page.dom.class_add(star, &self.outline_class)?;
            }
        }
        Ok(())
    }
}

/// Shows a back-to-top button once the page is scrolled past a threshold.
#[derive(Debug, Clone)]
pub struct ScrollTopButton {
    pub button_id: String,
    pub threshold_px: i64,
}

impl Default for ScrollTopButton {
    fn default() -> Self {
        Self {
            button_id: "scroll-top-btn".to_string(),
            threshold_px: 300,
        }
    }
}

impl ScrollTopButton {
    /// Registers the watcher and evaluates it once for the current offset.
    pub fn install(&self, page: &mut Page) -> Result<()> {
        page.install_scroll_watcher(self.clone());
        self.apply(page)
    }

    pub(crate) fn apply(&self, page: &mut Page) -> Result<()> {
        let Some(button) = page.dom.by_id(&self.button_id) else {
            return Ok(());
        };
        let display = if page.scroll_y() > self.threshold_px {
            "block"
        } else {
            "none"
        };
        page.dom.style_set(button, "display", display)
    }
}

/// Requests an animated scroll back to the top of the page.
pub fn scroll_to_top(page: &mut Page) -> Result<()> {
    page.request_scroll(0, true)
}

/// The full marketplace behavior set with the stock markup contract.
/// `install` wires everything that the server-rendered page expects to be
/// active from the start; the remaining behaviors are invoked directly where
/// the markup would call them.
#[derive(Debug, Clone, Default)]
pub struct PageBehaviors {
    pub alerts: AlertAutoDismiss,
    pub cart: CartFeedback,
    pub preview: ImagePreview,
    pub search: SearchFilter,
    pub quantity: QuantityClamp,
    pub rating: RatingWidget,
    pub scroll: ScrollTopButton,
}

impl PageBehaviors {
    pub fn install(&self, page: &mut Page) -> Result<()> {
        self.alerts.install(page)?;
        self.search.install(page)?;
        self.rating.install(page)?;
        self.scroll.install(page)?;
        Ok(())
    }
}
