#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This allows us to access console.log from JS
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    // Use `js_namespace` to bind `console.log(..)` instead of just `log(..)`
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log_raw(s: &str);
}

#[cfg(target_arch = "wasm32")]
pub fn log(s: &str) {
    console_log_raw(s);
}

// Native hosts (tests, CLI wrappers) get a tracing event instead of a JS call
#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    tracing::info!(target: "cityblock", "{}", s);
}

// console_log! itself lives in lib.rs
