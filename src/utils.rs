use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

pub fn get_origin() -> Result<String, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("could not obtain window"))?
        .location()
        .origin()
}

/// Resolves after `millis` on the window timer.
pub async fn sleep(millis: u32) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("could not obtain window"))?;
    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis as i32);
    });

    scheduled?;
    JsFuture::from(promise).await.map(|_| ())
}
