use page_behaviors::{
    confirm_delete, scroll_to_top, Page, PageBehaviors, ScrollRequest, SelectedFile,
    DEFAULT_DELETE_PROMPT,
};

#[test]
fn product_detail_page_purchase_flow() -> page_behaviors::Result<()> {
    let html = r#"
    <div class="alert alert-success">Listing updated.</div>
    <h1 class="product-title">Vintage Lamp</h1>
    <input id="quantity" type="number" value="99">
    <button id="add-to-cart-btn" class="btn btn-primary">Add to Cart</button>
    <button id="scroll-top-btn">Top</button>
    "#;

    let mut page = Page::from_html(html)?;
    let behaviors = PageBehaviors::default();
    behaviors.install(&mut page)?;

    behaviors.quantity.validate(&mut page, "#quantity", 10)?;
    page.assert_value("#quantity", "10")?;
    assert_eq!(
        page.alert_messages(),
        &["Maximum available quantity is 10".to_string()]
    );

    behaviors.cart.add_to_cart(&mut page, "#add-to-cart-btn")?;
    page.assert_text("#add-to-cart-btn", "Added!")?;

    // Cart revert fires at 2000, alert dismissal at 5000.
    page.advance_time(2000)?;
    page.assert_text("#add-to-cart-btn", "Add to Cart")?;
    page.assert_exists(".alert-success")?;

    page.advance_time(3000)?;
    page.assert_missing(".alert")?;
    page.assert_exists(".product-title")?;
    Ok(())
}

#[test]
fn listing_page_search_and_back_to_top() -> page_behaviors::Result<()> {
    let html = r#"
    <input id="product-search" type="text" placeholder="Search products...">
    <div class="product-card" id="card-lamp">
      <h3 class="product-name">Vintage Lamp</h3>
    </div>
    <div class="product-card" id="card-chair">
      <h3 class="product-name">Office Chair</h3>
    </div>
    <button id="scroll-top-btn">Top</button>
    "#;

    let mut page = Page::from_html(html)?;
    PageBehaviors::default().install(&mut page)?;
    page.assert_style("#scroll-top-btn", "display", "none")?;

    page.type_text("#product-search", "chair")?;
    page.assert_style("#card-lamp", "display", "none")?;
    page.assert_style("#card-chair", "display", "block")?;

    page.type_text("#product-search", "")?;
    page.assert_style("#card-lamp", "display", "block")?;

    page.set_scroll_y(640)?;
    page.assert_style("#scroll-top-btn", "display", "block")?;

    scroll_to_top(&mut page)?;
    assert_eq!(page.scroll_y(), 0);
    assert_eq!(
        page.scroll_requests(),
        &[ScrollRequest {
            top: 0,
            smooth: true
        }]
    );
    page.assert_style("#scroll-top-btn", "display", "none")?;
    Ok(())
}

#[test]
fn review_form_star_rating() -> page_behaviors::Result<()> {
    let html = r#"
    <form id="review-form">
      <input type="hidden" id="rating-input" name="rating" value="">
      <i class="rating-star far" id="star-1"></i>
      <i class="rating-star far" id="star-2"></i>
      <i class="rating-star far" id="star-3"></i>
      <i class="rating-star far" id="star-4"></i>
      <i class="rating-star far" id="star-5"></i>
      <textarea id="comment">Great product</textarea>
    </form>
    "#;

    let mut page = Page::from_html(html)?;
    PageBehaviors::default().install(&mut page)?;

    page.click("#star-4")?;
    page.assert_value("#rating-input", "4")?;
    page.assert_exists("#star-4.fas")?;
    page.assert_exists("#star-5.far")?;
    page.assert_missing("#star-5.fas")?;
    page.assert_value("#comment", "Great product")?;
    Ok(())
}

#[test]
fn product_form_image_preview() -> page_behaviors::Result<()> {
    let html = r#"
    <form id="product-form">
      <input type="file" id="id-image" accept="image/*">
      <img id="image-preview" style="display: none" alt="Preview">
    </form>
    "#;

    let mut page = Page::from_html(html)?;
    let behaviors = PageBehaviors::default();
    behaviors.install(&mut page)?;

    page.choose_file("#id-image", SelectedFile::new("lamp.png", "image/png", "hello"))?;
    behaviors.preview.preview(&mut page, "#id-image")?;
    page.flush()?;

    page.assert_style("#image-preview", "display", "block")?;
    let snippet = page.dump_dom("#image-preview")?;
    assert!(snippet.contains("data:image/png;base64,aGVsbG8="));
    Ok(())
}

#[test]
fn delete_button_is_gated_by_confirmation() -> page_behaviors::Result<()> {
    let mut page = Page::from_html(r#"<a id="delete-link" href="/items/7/delete">Delete</a>"#)?;

    // Declined: the default response is to cancel.
    assert!(!confirm_delete(&mut page, None));

    page.enqueue_confirm_response(true);
    assert!(confirm_delete(&mut page, None));
    assert_eq!(
        page.confirm_messages(),
        &[
            DEFAULT_DELETE_PROMPT.to_string(),
            DEFAULT_DELETE_PROMPT.to_string()
        ]
    );
    Ok(())
}
