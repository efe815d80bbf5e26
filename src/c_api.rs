// C entry points for a host UI. Strings cross the boundary as JSON and every
// call is wrapped in catch_unwind so a bad input can never take the UI down.
use crate::core::engine::PhraseEngine;
use crate::core::phrase::resolve_phrase;
use crate::core::rules::RuleSet;
use crate::core::tail::resolve_tail_form;
use crate::core::types::{ResolvedPhrase, TailForm, Token};
use crate::persistence::parse_rules_json;
use libc::c_char;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use tracing::{error, warn};

#[derive(Serialize)]
struct Resolution {
    phrase: ResolvedPhrase,
    tail: Option<TailForm>,
}

unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn rules_from_json(json: Option<&str>) -> RuleSet {
    match json {
        Some(j) => parse_rules_json(j).unwrap_or_else(|e| {
            warn!("Ignoring unreadable rules: {}", e);
            RuleSet::empty()
        }),
        None => RuleSet::empty(),
    }
}

unsafe fn engine_mut<'a>(handle: *mut PhraseEngine) -> Option<&'a mut PhraseEngine> {
    handle.as_mut()
}

#[no_mangle]
pub extern "C" fn phrase_engine_new(rules_json: *const c_char) -> *mut PhraseEngine {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let rules = rules_from_json(unsafe { read_str(rules_json) });
        Box::into_raw(Box::new(PhraseEngine::new(rules)))
    }));
    result.unwrap_or_else(|_| {
        error!("Panic while creating phrase engine");
        ptr::null_mut()
    })
}

#[no_mangle]
pub extern "C" fn phrase_engine_free(handle: *mut PhraseEngine) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

/// Returns the utterance JSON for the tap, or `null`.
#[no_mangle]
pub extern "C" fn phrase_engine_select(
    handle: *mut PhraseEngine,
    id: *const c_char,
    text: *const c_char,
) -> *mut c_char {
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let (engine, id) = match (engine_mut(handle), read_str(id)) {
            (Some(engine), Some(id)) => (engine, id),
            _ => return "null".to_string(),
        };
        let text = read_str(text).unwrap_or(id);
        to_json(&engine.select(id, text))
    }));
    into_c_string(result.unwrap_or_else(|_| {
        error!("Panic in phrase_engine_select");
        "null".to_string()
    }))
}

#[no_mangle]
pub extern "C" fn phrase_engine_play_all(handle: *mut PhraseEngine) -> *mut c_char {
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        let phrase = engine_mut(handle)
            .map(|engine| engine.play_all())
            .unwrap_or_default();
        to_json(&phrase)
    }));
    into_c_string(result.unwrap_or_else(|_| {
        error!("Panic in phrase_engine_play_all");
        to_json(&ResolvedPhrase::default())
    }))
}

#[no_mangle]
pub extern "C" fn phrase_engine_undo(handle: *mut PhraseEngine) {
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        if let Some(engine) = engine_mut(handle) {
            engine.undo();
        }
    }));
    if result.is_err() {
        error!("Panic in phrase_engine_undo");
    }
}

#[no_mangle]
pub extern "C" fn phrase_engine_reset(handle: *mut PhraseEngine) {
    let result = catch_unwind(AssertUnwindSafe(|| unsafe {
        if let Some(engine) = engine_mut(handle) {
            engine.reset();
        }
    }));
    if result.is_err() {
        error!("Panic in phrase_engine_reset");
    }
}

/// Stateless resolution: `{"phrase": {...}, "tail": {...} | null}`.
#[no_mangle]
pub extern "C" fn phrase_resolve(tokens_json: *const c_char, rules_json: *const c_char) -> *mut c_char {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let tokens: Vec<Token> = unsafe { read_str(tokens_json) }
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default();
        let rules = rules_from_json(unsafe { read_str(rules_json) });
        to_json(&Resolution {
            phrase: resolve_phrase(&tokens, &rules),
            tail: resolve_tail_form(&tokens, &rules),
        })
    }));
    into_c_string(result.unwrap_or_else(|_| {
        error!("Panic in phrase_resolve");
        "null".to_string()
    }))
}

#[no_mangle]
pub extern "C" fn phrase_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"[{"id":"c","pattern":["kaks","kass"],
        "parts":[{"surface":"kaks"},{"surface":"kassi"}]}]"#;

    fn take(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let out = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
        phrase_string_free(s);
        out
    }

    #[test]
    fn engine_round_trip() {
        let rules = CString::new(RULES).unwrap();
        let handle = phrase_engine_new(rules.as_ptr());
        assert!(!handle.is_null());

        let kaks = CString::new("kaks").unwrap();
        let kass = CString::new("kass").unwrap();
        take(phrase_engine_select(handle, kaks.as_ptr(), kaks.as_ptr()));
        let tail = take(phrase_engine_select(handle, kass.as_ptr(), ptr::null()));
        assert!(tail.contains(r#""surface":"kassi""#));

        let phrase = take(phrase_engine_play_all(handle));
        assert!(phrase.contains(r#""display":"kaks kassi""#));

        phrase_engine_reset(handle);
        let phrase = take(phrase_engine_play_all(handle));
        assert!(phrase.contains(r#""display":"""#));
        phrase_engine_free(handle);
    }

    #[test]
    fn null_inputs_are_harmless() {
        assert_eq!(take(phrase_engine_select(ptr::null_mut(), ptr::null(), ptr::null())), "null");
        phrase_engine_undo(ptr::null_mut());
        phrase_engine_reset(ptr::null_mut());
        phrase_engine_free(ptr::null_mut());
        let out = take(phrase_resolve(ptr::null(), ptr::null()));
        assert!(out.contains(r#""tail":null"#));
    }

    #[test]
    fn stateless_resolve() {
        let tokens = CString::new(
            r#"[{"id":"kaks","text":"kaks"},{"id":"kass","text":"kass"}]"#,
        )
        .unwrap();
        let rules = CString::new(RULES).unwrap();
        let out = take(phrase_resolve(tokens.as_ptr(), rules.as_ptr()));
        assert!(out.contains(r#""tts":"kaks kassi""#));
        assert!(out.contains(r#""tail":{"surface":"kassi","tts":"kassi"}"#));
    }

    #[test]
    fn bad_rules_json_gives_empty_rules() {
        let rules = CString::new("{oops").unwrap();
        let handle = phrase_engine_new(rules.as_ptr());
        let kass = CString::new("kass").unwrap();
        let u = take(phrase_engine_select(handle, kass.as_ptr(), kass.as_ptr()));
        assert!(u.contains(r#""compound":null"#));
        phrase_engine_free(handle);
    }
}
