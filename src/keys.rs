//! Key encoding for `send-keys`
//!
//! Keystrokes typed into a tmux-backed pane are forwarded with `send-keys`
//! rather than written to a PTY. Named keys use tmux's key names (`Up`,
//! `BSpace`, `F5`, ...) with `S-`/`M-` modifier prefixes; raw input bytes
//! are converted by [`escape_keys_for_tmux`].

use winit::keyboard::{Key, ModifiersState, NamedKey};

/// tmux name for a named key, `None` when tmux has no name for it.
///
/// Callers fall back to literal-character encoding for unknown keys.
pub fn special_key(key: &NamedKey) -> Option<&'static str> {
    let name = match key {
        NamedKey::Enter => "Enter",
        NamedKey::Tab => "Tab",
        NamedKey::Backspace => "BSpace",
        NamedKey::Escape => "Escape",
        NamedKey::Space => "Space",
        NamedKey::ArrowUp => "Up",
        NamedKey::ArrowDown => "Down",
        NamedKey::ArrowLeft => "Left",
        NamedKey::ArrowRight => "Right",
        NamedKey::Home => "Home",
        NamedKey::End => "End",
        NamedKey::PageUp => "PPage",
        NamedKey::PageDown => "NPage",
        NamedKey::Insert => "IC",
        NamedKey::Delete => "DC",
        NamedKey::F1 => "F1",
        NamedKey::F2 => "F2",
        NamedKey::F3 => "F3",
        NamedKey::F4 => "F4",
        NamedKey::F5 => "F5",
        NamedKey::F6 => "F6",
        NamedKey::F7 => "F7",
        NamedKey::F8 => "F8",
        NamedKey::F9 => "F9",
        NamedKey::F10 => "F10",
        NamedKey::F11 => "F11",
        NamedKey::F12 => "F12",
        _ => return None,
    };
    Some(name)
}

/// Prefix a tmux key name with its modifiers.
///
/// Shift becomes `S-` and Alt/Option becomes `M-`, shift first. The
/// Super/Command modifier is never forwarded; the host application owns it.
pub fn with_modifier_prefix(modifiers: ModifiersState, key: &str) -> String {
    let mut result = String::with_capacity(key.len() + 4);
    if modifiers.shift_key() {
        result.push_str("S-");
    }
    if modifiers.alt_key() {
        result.push_str("M-");
    }
    result.push_str(key);
    result
}

/// Encode a key event as a single `send-keys` argument.
///
/// Returns `None` for keys that should be sent as literal text instead
/// (plain printable characters, or keys tmux cannot name).
pub fn encode_key(key: &Key, modifiers: ModifiersState) -> Option<String> {
    match key {
        Key::Named(named) => special_key(named).map(|name| with_modifier_prefix(modifiers, name)),
        Key::Character(s) if modifiers.control_key() => {
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_some() || !c.is_ascii_alphabetic() {
                return None;
            }
            // Shift is implied by the letter's case for control keys
            let alt_only = modifiers & ModifiersState::ALT;
            Some(with_modifier_prefix(
                alt_only,
                &format!("C-{}", c.to_ascii_lowercase()),
            ))
        }
        Key::Character(s) if modifiers.alt_key() => {
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(format!("M-{c}"))
        }
        _ => None,
    }
}

/// Escape a byte sequence for the tmux `send-keys` command.
///
/// Printable runs are sent as single-quoted literals, control bytes as
/// tmux key names (`C-a`, `Escape`, `BSpace`), and bytes above ASCII as
/// hex keys.
pub fn escape_keys_for_tmux(data: &[u8]) -> String {
    let mut result = String::new();
    let mut in_literal = false;

    for &byte in data {
        match byte {
            0x00 => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("C-Space ");
            }
            0x09 => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("Tab ");
            }
            0x0d => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("Enter ");
            }
            0x01..=0x1a => {
                close_literal(&mut result, &mut in_literal);
                // Ctrl+A through Ctrl+Z
                result.push_str(&format!("C-{} ", (b'a' + byte - 1) as char));
            }
            0x1b => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("Escape ");
            }
            0x7f => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("BSpace ");
            }
            b'\'' => {
                if !in_literal {
                    result.push('\'');
                    in_literal = true;
                }
                result.push_str("'\\''");
            }
            b' ' => {
                close_literal(&mut result, &mut in_literal);
                result.push_str("Space ");
            }
            0x21..=0x7e => {
                if !in_literal {
                    result.push('\'');
                    in_literal = true;
                }
                result.push(byte as char);
            }
            _ => {
                close_literal(&mut result, &mut in_literal);
                result.push_str(&format!("0x{:02x} ", byte));
            }
        }
    }

    close_literal(&mut result, &mut in_literal);
    result.trim().to_string()
}

fn close_literal(result: &mut String, in_literal: &mut bool) {
    if *in_literal {
        result.push_str("' ");
        *in_literal = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_keys() {
        assert_eq!(special_key(&NamedKey::Enter), Some("Enter"));
        assert_eq!(special_key(&NamedKey::Backspace), Some("BSpace"));
        assert_eq!(special_key(&NamedKey::ArrowUp), Some("Up"));
        assert_eq!(special_key(&NamedKey::PageDown), Some("NPage"));
        assert_eq!(special_key(&NamedKey::Delete), Some("DC"));
        assert_eq!(special_key(&NamedKey::F12), Some("F12"));
        assert_eq!(special_key(&NamedKey::CapsLock), None);
    }

    #[test]
    fn test_modifier_prefix_order() {
        let mods = ModifiersState::SHIFT | ModifiersState::ALT;
        assert_eq!(with_modifier_prefix(mods, "Up"), "S-M-Up");
    }

    #[test]
    fn test_modifier_prefix_single() {
        assert_eq!(with_modifier_prefix(ModifiersState::SHIFT, "Tab"), "S-Tab");
        assert_eq!(with_modifier_prefix(ModifiersState::ALT, "Left"), "M-Left");
    }

    #[test]
    fn test_super_is_never_forwarded() {
        assert_eq!(with_modifier_prefix(ModifiersState::SUPER, "Enter"), "Enter");
        assert_eq!(
            with_modifier_prefix(ModifiersState::SUPER | ModifiersState::SHIFT, "Enter"),
            "S-Enter"
        );
    }

    #[test]
    fn test_no_modifiers() {
        assert_eq!(with_modifier_prefix(ModifiersState::empty(), "F5"), "F5");
    }

    #[test]
    fn test_encode_named_key() {
        let key = Key::Named(NamedKey::ArrowDown);
        assert_eq!(
            encode_key(&key, ModifiersState::SHIFT),
            Some("S-Down".to_string())
        );
    }

    #[test]
    fn test_encode_ctrl_letter() {
        let key = Key::Character("C".into());
        assert_eq!(
            encode_key(&key, ModifiersState::CONTROL | ModifiersState::SHIFT),
            Some("C-c".to_string())
        );
        assert_eq!(
            encode_key(&key, ModifiersState::CONTROL | ModifiersState::ALT),
            Some("M-C-c".to_string())
        );
    }

    #[test]
    fn test_encode_alt_char() {
        let key = Key::Character("x".into());
        assert_eq!(encode_key(&key, ModifiersState::ALT), Some("M-x".to_string()));
    }

    #[test]
    fn test_encode_plain_char_falls_back() {
        let key = Key::Character("a".into());
        assert_eq!(encode_key(&key, ModifiersState::empty()), None);
        assert_eq!(encode_key(&key, ModifiersState::SUPER), None);
    }

    #[test]
    fn test_escape_keys_simple() {
        assert_eq!(escape_keys_for_tmux(b"hello"), "'hello'");
    }

    #[test]
    fn test_escape_keys_with_space() {
        assert_eq!(escape_keys_for_tmux(b"ls -la"), "'ls' Space '-la'");
    }

    #[test]
    fn test_escape_keys_control_bytes() {
        assert_eq!(escape_keys_for_tmux(&[0x03]), "C-c");
        assert_eq!(escape_keys_for_tmux(&[0x1b]), "Escape");
        assert_eq!(escape_keys_for_tmux(b"ls\r"), "'ls' Enter");
        assert_eq!(escape_keys_for_tmux(&[0x7f]), "BSpace");
    }

    #[test]
    fn test_escape_keys_quote() {
        assert_eq!(escape_keys_for_tmux(b"it's"), "'it'\\''s'");
    }

    #[test]
    fn test_escape_keys_high_bytes() {
        assert_eq!(escape_keys_for_tmux("é".as_bytes()), "0xc3 0xa9");
    }
}
