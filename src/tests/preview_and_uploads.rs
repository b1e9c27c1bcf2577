use super::*;

const UPLOAD_FORM: &str = r#"
    <input type='file' id='id-photo' accept='image/*'>
    <img id='image-preview' style='display: none'>
    "#;

#[test]
fn selected_file_is_shown_as_a_data_url() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    page.choose_file("#id-photo", SelectedFile::new("photo.png", "image/png", "hello"))?;

    ImagePreview::default().preview(&mut page, "#id-photo")?;
    page.run_due_timers()?;

    let preview = page.select_one("#image-preview")?;
    assert_eq!(
        page.dom.attr(preview, "src"),
        Some("data:image/png;base64,aGVsbG8=".to_string())
    );
    page.assert_style("#image-preview", "display", "block")?;
    Ok(())
}

#[test]
fn read_latency_delays_delivery_until_the_timer_fires() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    page.choose_file("#id-photo", SelectedFile::new("photo.jpg", "image/jpeg", "x"))?;

    let preview = ImagePreview {
        read_latency_ms: 50,
        ..ImagePreview::default()
    };
    preview.preview(&mut page, "#id-photo")?;

    page.advance_time(49)?;
    page.assert_style("#image-preview", "display", "none")?;

    page.advance_time(1)?;
    page.assert_style("#image-preview", "display", "block")?;
    Ok(())
}

#[test]
fn no_selection_leaves_the_preview_untouched() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    ImagePreview::default().preview(&mut page, "#id-photo")?;
    assert!(page.pending_timers().is_empty());
    page.assert_style("#image-preview", "display", "none")?;
    Ok(())
}

#[test]
fn multi_file_selection_is_ignored() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    page.choose_files(
        "#id-photo",
        vec![
            SelectedFile::new("a.png", "image/png", "a"),
            SelectedFile::new("b.png", "image/png", "b"),
        ],
    )?;

    ImagePreview::default().preview(&mut page, "#id-photo")?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn missing_preview_element_is_a_no_op() -> Result<()> {
    let mut page = Page::from_html("<input type='file' id='id-photo'>")?;
    page.choose_file("#id-photo", SelectedFile::new("a.png", "image/png", "a"))?;

    ImagePreview::default().preview(&mut page, "#id-photo")?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn a_new_selection_replaces_the_shown_image() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    let preview = ImagePreview::default();

    page.choose_file("#id-photo", SelectedFile::new("a.png", "image/png", "a"))?;
    preview.preview(&mut page, "#id-photo")?;
    page.run_due_timers()?;

    page.choose_file("#id-photo", SelectedFile::new("b.gif", "image/gif", "b"))?;
    preview.preview(&mut page, "#id-photo")?;
    page.run_due_timers()?;

    let node = page.select_one("#image-preview")?;
    assert_eq!(
        page.dom.attr(node, "src"),
        Some("data:image/gif;base64,Yg==".to_string())
    );
    Ok(())
}

#[test]
fn clearing_the_selection_makes_later_previews_no_ops() -> Result<()> {
    let mut page = Page::from_html(UPLOAD_FORM)?;
    page.choose_file("#id-photo", SelectedFile::new("a.png", "image/png", "a"))?;
    page.clear_files("#id-photo")?;

    ImagePreview::default().preview(&mut page, "#id-photo")?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn choosing_a_file_on_a_text_input_is_rejected() -> Result<()> {
    let mut page = Page::from_html("<input type='text' id='name'>")?;
    let err = page
        .choose_file("#name", SelectedFile::new("a.png", "image/png", "a"))
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    Ok(())
}
