use super::*;

const CART_PAGE: &str = r#"
    <button id='buy' class='btn btn-primary'>Add to Cart</button>
    "#;

#[test]
fn add_to_cart_shows_feedback_then_reverts() -> Result<()> {
    let mut page = Page::from_html(CART_PAGE)?;
    let cart = CartFeedback::default();

    cart.add_to_cart(&mut page, "#buy")?;
    page.assert_text("#buy", "Added!")?;
    page.assert_exists("#buy.btn-success")?;
    assert!(page.dom.disabled(page.select_one("#buy")?));

    page.advance_time(1999)?;
    page.assert_text("#buy", "Added!")?;

    page.advance_time(1)?;
    page.assert_text("#buy", "Add to Cart")?;
    page.assert_missing("#buy.btn-success")?;
    assert!(!page.dom.disabled(page.select_one("#buy")?));
    Ok(())
}

#[test]
fn reinvoking_while_pending_replaces_the_timer_and_keeps_the_first_label() -> Result<()> {
    let mut page = Page::from_html(CART_PAGE)?;
    let cart = CartFeedback::default();

    cart.add_to_cart(&mut page, "#buy")?;
    page.advance_time(1500)?;

    // Second press while the revert is pending: the old timer is replaced,
    // the label captured at the first press survives.
    cart.add_to_cart(&mut page, "#buy")?;
    assert_eq!(page.pending_timers().len(), 1);

    page.advance_time(500)?;
    // Old deadline passed, nothing reverted yet.
    page.assert_text("#buy", "Added!")?;

    page.advance_time(1500)?;
    page.assert_text("#buy", "Add to Cart")?;
    assert!(!page.dom.disabled(page.select_one("#buy")?));
    Ok(())
}

#[test]
fn add_to_cart_missing_button_is_a_no_op() -> Result<()> {
    let mut page = Page::from_html("<p>no button here</p>")?;
    CartFeedback::default().add_to_cart(&mut page, "#buy")?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn custom_feedback_label_and_class_are_used() -> Result<()> {
    let mut page = Page::from_html(CART_PAGE)?;
    let cart = CartFeedback {
        added_label: "In cart".into(),
        success_class: "is-added".into(),
        revert_after_ms: 100,
    };

    cart.add_to_cart(&mut page, "#buy")?;
    page.assert_text("#buy", "In cart")?;
    page.assert_exists("#buy.is-added")?;

    page.advance_time(100)?;
    page.assert_text("#buy", "Add to Cart")?;
    Ok(())
}

#[test]
fn quantity_below_minimum_clamps_to_minimum() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='0'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "1")?;
    assert!(page.alert_messages().is_empty());
    Ok(())
}

#[test]
fn quantity_above_maximum_clamps_and_raises_notice() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='15'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "10")?;
    assert_eq!(
        page.alert_messages(),
        &["Maximum available quantity is 10".to_string()]
    );
    Ok(())
}

#[test]
fn quantity_in_range_is_left_unchanged() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='5'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "5")?;
    assert!(page.alert_messages().is_empty());
    Ok(())
}

#[test]
fn non_numeric_quantity_clamps_to_minimum_without_notice() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='abc'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "1")?;
    assert!(page.alert_messages().is_empty());

    page.type_text("#qty", "")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "1")?;
    Ok(())
}

#[test]
fn quantity_overflowing_digit_string_counts_as_above_maximum() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='99999999999999999999'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "10")?;
    assert_eq!(
        page.alert_messages(),
        &["Maximum available quantity is 10".to_string()]
    );
    Ok(())
}

#[test]
fn quantity_overflowing_negative_string_clamps_to_minimum() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='-99999999999999999999'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "1")?;
    assert!(page.alert_messages().is_empty());
    Ok(())
}

#[test]
fn quantity_validation_missing_input_is_a_no_op() -> Result<()> {
    let mut page = Page::from_html("<p>nothing</p>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    assert!(page.alert_messages().is_empty());
    Ok(())
}

#[test]
fn negative_quantity_clamps_to_minimum() -> Result<()> {
    let mut page = Page::from_html("<input id='qty' type='number' value='-3'>")?;
    QuantityClamp::default().validate(&mut page, "#qty", 10)?;
    page.assert_value("#qty", "1")?;
    Ok(())
}
