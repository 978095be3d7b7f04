//! End-to-end tests for pass rendering

use chrono::NaiveDate;
use pass_common::Theme;
use pass_renderer::{
    qr::QrMatrix, render_pass, PassData, PhotoRef, RenderError, RenderRequest, SiteInfo,
    TemplateKey,
};

fn site() -> SiteInfo {
    SiteInfo::new("https://pass.example.org", "https://www.example.org")
}

fn ada() -> PassData {
    PassData {
        pass_id: Some("KAIROS-1234".to_string()),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        ..PassData::default()
    }
}

fn request(template: &str) -> RenderRequest {
    RenderRequest::new(template, ada(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
}

#[test]
fn test_rendering_is_byte_identical_for_identical_inputs() {
    let photo = PhotoRef::from_data_uri("data:image/jpeg;base64,/9j/4AAQSkZJRg==").unwrap();

    for template in ["story", "card"] {
        for photo in [None, Some(photo.clone())] {
            let req = request(template).with_color(Some("ocean")).with_photo(photo);
            let first = render_pass(&req, &site()).expect("first render");
            let second = render_pass(&req, &site()).expect("second render");
            assert_eq!(first.svg, second.svg, "template {template}");
        }
    }
}

#[test]
fn test_document_contains_name_and_pass_id() {
    let pass = render_pass(&request("story"), &site()).unwrap();

    assert!(pass.svg.starts_with("<svg"));
    assert!(pass.svg.ends_with("</svg>"));
    assert!(pass.svg.contains("Ada Lovelace"));
    assert!(pass.svg.contains("KAIROS-1234"));
    assert_eq!(pass.pass_id, "KAIROS-1234");
    assert_eq!((pass.width, pass.height), (1080, 1920));

    for id in [
        "slot-watermark",
        "slot-photo",
        "slot-logo",
        "slot-quote",
        "slot-verse",
        "slot-name",
        "slot-pass-id",
        "slot-footer",
    ] {
        assert!(pass.svg.contains(&format!("id=\"{id}\"")), "missing {id}");
    }
}

#[test]
fn test_no_photo_places_code_for_pass_url() {
    let pass = render_pass(&request("card"), &site()).unwrap();

    let url = "https://pass.example.org/pass/KAIROS-1234";
    assert!(pass.svg.contains(r#"data-content="code""#));
    assert!(pass.svg.contains(&format!(r#"data-value="{url}""#)));
    assert!(pass.svg.contains(&QrMatrix::encode(url).unwrap().path_data()));
    assert!(!pass.svg.contains("<image"));
}

#[test]
fn test_photo_replaces_code() {
    let photo = PhotoRef::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
    let pass = render_pass(&request("story").with_photo(Some(photo)), &site()).unwrap();

    assert!(pass.svg.contains(r#"data-content="photo""#));
    assert!(pass.svg.contains(r#"xlink:href="data:image/png;base64,iVBORw0KGgo=""#));
    assert!(!pass.svg.contains(r#"data-content="code""#));
}

#[test]
fn test_long_values_stay_inside_their_boxes() {
    let mut data = ada();
    data.pass_id = Some("KAIROS-12345678".to_string());
    data.first_name = Some("Maximiliana Alexandrina".to_string());
    data.last_name = Some("Featherstonehaugh".to_string());
    let req = RenderRequest::new("story", data, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

    let pass = render_pass(&req, &site()).unwrap();
    let layout = TemplateKey::Story.layout();

    // Name is cut to the box, the identifier is kept whole at a smaller size
    assert!(pass.svg.contains(">Maximiliana…</text>"));
    assert!(!pass.svg.contains("Featherstonehaugh"));
    let shrunk = (layout.pass_id.font_size * 14.0 / 15.0).floor();
    assert_eq!(layout.pass_id.max_chars, 14);
    assert!(pass
        .svg
        .contains(&format!(r#"font-size="{shrunk}" font-weight="700" fill="#)));
    assert!(pass.svg.contains(">KAIROS-12345678</text>"));
}

#[test]
fn test_unknown_color_uses_default_palette() {
    let typo = render_pass(&request("story").with_color(Some("ocaen")), &site()).unwrap();
    let default = render_pass(&request("story").with_theme(Theme::default()), &site()).unwrap();
    assert_eq!(typo.svg, default.svg);

    let ocean = render_pass(&request("story").with_color(Some("ocean")), &site()).unwrap();
    assert_ne!(ocean.svg, default.svg);
    assert!(ocean.svg.contains(Theme::Ocean.palette().background_top));
}

#[test]
fn test_unknown_template_is_reported() {
    let err = render_pass(&request("poster"), &site()).unwrap_err();
    assert!(matches!(err, RenderError::TemplateNotFound(ref key) if key == "poster"));
}

#[test]
fn test_missing_identifier_is_reported() {
    let mut req = request("story");
    req.data.pass_id = None;
    let err = render_pass(&req, &site()).unwrap_err();
    assert!(matches!(err, RenderError::MissingData(_)));
    assert!(err.to_string().starts_with("Missing required data"));
}

#[test]
fn test_user_text_is_escaped() {
    let mut req = request("story");
    req.data.first_name = Some("<script>".to_string());
    req.data.message = Some("Fish & chips".to_string());
    let pass = render_pass(&req, &site()).unwrap();

    assert!(!pass.svg.contains("<script>"));
    assert!(pass.svg.contains("&lt;script&gt; Lovelace"));
    assert!(pass.svg.contains("Fish &amp; chips"));
}

#[test]
fn test_target_size_keeps_template_viewbox() {
    let pass = render_pass(&request("card").with_size(540, 675), &site()).unwrap();
    assert_eq!(pass.template, TemplateKey::Card);
    assert!(pass.svg.contains(r#"width="540" height="675" viewBox="0 0 1080 1350""#));

    let err = render_pass(&request("card").with_size(0, 675), &site()).unwrap_err();
    assert!(matches!(err, RenderError::InvalidSize { width: 0, height: 675 }));
}

#[test]
fn test_output_parses_as_svg() {
    let pass = render_pass(&request("story"), &site()).unwrap();
    let tree = usvg::Tree::from_str(&pass.svg, &usvg::Options::default()).expect("valid svg");
    assert_eq!(tree.size().width(), 1080.0);
    assert_eq!(tree.size().height(), 1920.0);
}

#[test]
fn test_html_wrapper_embeds_document() {
    let pass = render_pass(&request("story"), &site()).unwrap();
    let html = pass.to_html();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Pass KAIROS-1234</title>"));
    assert!(html.contains(&pass.svg));
}
