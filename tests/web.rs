#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn layer_with(html: &str) -> web_sys::HtmlElement {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    let layer = document
        .create_element("div")
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    layer.set_inner_html(html);
    document.body().unwrap().append_child(&layer).unwrap();
    layer
}

#[wasm_bindgen_test]
fn attach_finds_target_colored_elements() {
    let layer = layer_with(
        r#"<h1 style="color: #ffffff">a</h1><p style="background-color: rgb(255,255,255)">b</p><span>c</span>"#,
    );
    let handle = glitch_wasm::attach(layer.clone(), JsValue::UNDEFINED).unwrap();
    assert_eq!(handle.matched_count(), 2);
    layer.remove();
}

#[wasm_bindgen_test]
fn svg_elements_are_not_scanned() {
    let layer = layer_with(
        r#"<h1 style="color: #ffffff">a</h1><svg style="color: #ffffff"><text style="fill: #ffffff">b</text></svg>"#,
    );
    let handle = glitch_wasm::attach(layer.clone(), JsValue::UNDEFINED).unwrap();
    assert_eq!(handle.matched_count(), 1);
    layer.remove();
}

#[wasm_bindgen_test]
fn attach_rejects_bad_target() {
    let layer = layer_with("<h1>a</h1>");
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"target".into(), &"nope".into()).unwrap();
    assert!(glitch_wasm::attach(layer.clone(), options.into()).is_err());
    layer.remove();
}

#[wasm_bindgen_test(async)]
async fn destroy_restores_the_page() {
    let layer = layer_with(r#"<h1 style="color: #00ff00">glitch</h1>"#);
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"target".into(), &"#00FF00".into()).unwrap();
    let mut handle = glitch_wasm::attach(layer.clone(), options.into()).unwrap();

    // let the zero-delay round run
    let tick = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 50)
            .unwrap();
    });
    wasm_bindgen_futures::JsFuture::from(tick).await.unwrap();
    assert!(handle.is_glitching());
    assert_eq!(layer.get_elements_by_class_name("rm-glitch").length(), 1);

    handle.destroy();
    assert!(!handle.is_glitching());
    assert_eq!(layer.get_elements_by_class_name("rm-glitch").length(), 0);
    let title = layer.first_element_child().unwrap().dyn_into::<web_sys::HtmlElement>().unwrap();
    assert_eq!(title.style().get_property_value("opacity").unwrap(), "1");
    layer.remove();
}
