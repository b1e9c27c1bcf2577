use super::*;

#[test]
fn alerts_present_at_install_close_after_five_seconds() -> Result<()> {
    let html = r#"
        <div class='alert alert-success'>Saved!</div>
        <div class='alert alert-danger'>Out of stock.</div>
        <div class='notice'>stays put</div>
        "#;

    let mut page = Page::from_html(html)?;
    AlertAutoDismiss::default().install(&mut page)?;

    page.advance_time(4999)?;
    page.assert_exists(".alert-success")?;
    page.assert_exists(".alert-danger")?;

    page.advance_time(1)?;
    page.assert_missing(".alert")?;
    page.assert_exists(".notice")?;
    Ok(())
}

#[test]
fn each_alert_is_closed_exactly_once() -> Result<()> {
    let mut page = Page::from_html("<div class='alert'>once</div>")?;
    AlertAutoDismiss::default().install(&mut page)?;

    page.flush()?;
    assert!(page.pending_timers().is_empty());

    // A later flush has nothing left to run.
    page.advance_time(10_000)?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn install_covers_only_alerts_present_at_that_moment() -> Result<()> {
    let mut page = Page::from_html("<div class='alert'>early</div>")?;
    AlertAutoDismiss::default().install(&mut page)?;
    assert_eq!(page.pending_timers().len(), 1);

    // Installing again against the same snapshot schedules again; nothing
    // watches for alerts appearing later.
    AlertAutoDismiss::default().install(&mut page)?;
    assert_eq!(page.pending_timers().len(), 2);
    Ok(())
}

#[test]
fn custom_alert_widget_controls_how_closing_looks() -> Result<()> {
    struct FadeOut;

    impl AlertWidget for FadeOut {
        fn close(&self, mut alert: AlertElement<'_>) -> Result<()> {
            alert.add_class("fade")?;
            alert.set_style("display", "none")
        }
    }

    let mut page = Page::from_html("<div class='alert'>soft close</div>")?;
    page.set_alert_widget(std::rc::Rc::new(FadeOut));
    AlertAutoDismiss::default().install(&mut page)?;

    page.flush()?;
    page.assert_exists(".alert.fade")?;
    page.assert_style(".alert", "display", "none")?;
    Ok(())
}

#[test]
fn confirm_delete_uses_default_message_when_none_given() -> Result<()> {
    let mut page = Page::from_html("<p>item</p>")?;
    page.enqueue_confirm_response(true);

    let accepted = confirm_delete(&mut page, None);
    assert!(accepted);
    assert_eq!(
        page.confirm_messages(),
        &["Are you sure you want to delete this item?".to_string()]
    );
    Ok(())
}

#[test]
fn confirm_delete_shows_caller_message_verbatim() -> Result<()> {
    let mut page = Page::from_html("<p>item</p>")?;
    page.enqueue_confirm_response(false);

    let accepted = confirm_delete(&mut page, Some("Remove this listing?"));
    assert!(!accepted);
    assert_eq!(page.confirm_messages(), &["Remove this listing?".to_string()]);
    Ok(())
}

#[test]
fn confirm_responses_are_consumed_in_order_then_fall_back_to_default() -> Result<()> {
    let mut page = Page::from_html("<p>item</p>")?;
    page.enqueue_confirm_response(true);
    page.enqueue_confirm_response(false);

    assert!(confirm_delete(&mut page, None));
    assert!(!confirm_delete(&mut page, None));
    // Queue exhausted: default applies.
    assert!(!confirm_delete(&mut page, None));

    page.set_default_confirm_response(true);
    assert!(confirm_delete(&mut page, None));
    Ok(())
}
