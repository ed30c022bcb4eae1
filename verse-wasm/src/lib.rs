use daily_verse::error::StorageError;
use daily_verse::loader::{InMemorySource, VerseLoader};
use daily_verse::{share, KeyValueStore, PolicyMode, Presenter, ThemeName, UserAction};
use daily_verse::{VerseRecord, VerseSession};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Any object with the Web Storage interface, normally `window.localStorage`
    #[derive(Clone)]
    pub type JsStorage;

    #[wasm_bindgen(method, js_name = getItem)]
    fn get_item(this: &JsStorage, key: &str) -> Option<String>;

    #[wasm_bindgen(method, catch, js_name = setItem)]
    fn set_item(this: &JsStorage, key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeItem)]
    fn remove_item(this: &JsStorage, key: &str) -> Result<(), JsValue>;
}

fn js_storage_error(e: JsValue) -> StorageError {
    StorageError::Io(std::io::Error::other(format!("{:?}", e)))
}

impl KeyValueStore for JsStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.get_item(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_item(key, value).map_err(js_storage_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_item(key).map_err(js_storage_error)
    }
}

/// Message shown in place of the verse when nothing could be loaded
const NO_VERSES_MESSAGE: &str =
    "Could not load verses. Open the page through a web server or embed the verse data.";

#[derive(Serialize)]
struct VerseView {
    index: usize,
    text: String,
    reference: String,
    reflection: String,
}

/// Collects presenter callbacks so they can be handed back to JS
#[derive(Default)]
struct Capture {
    verse: Option<VerseView>,
    theme: Option<ThemeName>,
}

impl Presenter for Capture {
    fn verse_selected(&mut self, index: usize, verse: &VerseRecord) {
        self.verse = Some(VerseView {
            index,
            text: verse.text.clone(),
            reference: verse.reference.clone(),
            reflection: verse.reflection.clone(),
        });
    }

    fn theme_changed(&mut self, theme: ThemeName) {
        self.theme = Some(theme);
    }
}

fn now() -> OffsetDateTime {
    let nanos = js_sys::Date::now() as i128 * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&format!("{}", e))
}

/// Browser-side verse session
#[wasm_bindgen]
pub struct VerseApp {
    session: VerseSession<JsStorage, StdRng>,
}

#[wasm_bindgen]
impl VerseApp {
    /// Build the session from the fetched payload, falling back to the
    /// payload embedded in the page
    ///
    /// Rejects with a user-facing message when neither payload holds verses.
    pub async fn init(
        primary: Option<String>,
        embedded: Option<String>,
        storage: JsStorage,
    ) -> Result<VerseApp, JsValue> {
        let loader = VerseLoader::new(Arc::new(InMemorySource::from_option(
            "verses.json",
            primary,
        )))
        .with_fallback(Arc::new(InMemorySource::from_option("verses-data", embedded)));
        let session = VerseSession::init(&loader, storage, StdRng::from_entropy())
            .await
            .map_err(|_| JsValue::from_str(NO_VERSES_MESSAGE))?;
        Ok(VerseApp { session })
    }

    /// Evaluate the stored policy; returns `{index, text, reference, reflection}`
    pub fn today(&mut self) -> Result<JsValue, JsValue> {
        let mut capture = Capture::default();
        self.session.start(now(), &mut capture).map_err(to_js)?;
        serde_wasm_bindgen::to_value(&capture.verse).map_err(to_js)
    }

    pub fn next(&mut self) -> Result<JsValue, JsValue> {
        self.dispatch(UserAction::Next)
    }

    /// Store a new policy mode and return its pick
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> Result<JsValue, JsValue> {
        self.dispatch(UserAction::ChangeMode(PolicyMode::from(mode)))
    }

    /// Flip the stored theme and return the new name
    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&mut self) -> Result<String, JsValue> {
        let mut capture = Capture::default();
        self.session
            .handle(UserAction::ToggleTheme, now(), &mut capture)
            .map_err(to_js)?;
        Ok(capture
            .theme
            .unwrap_or_else(|| self.session.settings().theme)
            .to_string())
    }

    pub fn theme(&self) -> String {
        self.session.settings().theme.to_string()
    }

    pub fn mode(&self) -> String {
        self.session.settings().mode.to_string()
    }

    /// Names of the selectable modes
    pub fn modes() -> Vec<String> {
        PolicyMode::ALL.iter().map(|m| m.to_string()).collect()
    }

    /// Clipboard text for the current verse
    #[wasm_bindgen(js_name = shareText)]
    pub fn share_text(&self) -> String {
        share::share_text(self.session.current())
    }

    /// WhatsApp link for the current verse
    #[wasm_bindgen(js_name = shareUrl)]
    pub fn share_url(&self) -> Result<String, JsValue> {
        share::whatsapp_url(self.session.current())
            .map(|url| url.to_string())
            .map_err(to_js)
    }
}

impl VerseApp {
    fn dispatch(&mut self, action: UserAction) -> Result<JsValue, JsValue> {
        let mut capture = Capture::default();
        self.session
            .handle(action, now(), &mut capture)
            .map_err(to_js)?;
        serde_wasm_bindgen::to_value(&capture.verse).map_err(to_js)
    }
}
