//! PS/2 keyboard decoder
//!
//! Translates scan code set 1 into console input codes: ASCII, control
//! characters and the `KEY_*` codes for the navigation block. Modifier and
//! lock state live in [`Keyboard`].

use crate::arch::Architecture;
use crate::config::{KBDATAP, KBSTATP, KBS_DIB};

use super::input::{
    ctrl, KEY_DEL, KEY_DN, KEY_END, KEY_HOME, KEY_INS, KEY_LF, KEY_PGDN, KEY_PGUP, KEY_RT, KEY_UP,
};

const NO: u8 = 0;

// Modifier state bits
const SHIFT: u8 = 1 << 0;
const CTL: u8 = 1 << 1;
const ALT: u8 = 1 << 2;
const CAPSLOCK: u8 = 1 << 3;
const NUMLOCK: u8 = 1 << 4;
const SCROLLLOCK: u8 = 1 << 5;
const E0ESC: u8 = 1 << 6;

/// Scan code prefix for the extended key block
const E0: u8 = 0xE0;
/// Set on key release
const RELEASE: u8 = 0x80;

#[rustfmt::skip]
const NORMAL: [u8; 0x58] = [
    NO,    0x1B,  b'1',  b'2',  b'3',  b'4',  b'5',  b'6',  // 0x00
    b'7',  b'8',  b'9',  b'0',  b'-',  b'=',  0x08,  b'\t',
    b'q',  b'w',  b'e',  b'r',  b't',  b'y',  b'u',  b'i',  // 0x10
    b'o',  b'p',  b'[',  b']',  b'\n', NO,    b'a',  b's',
    b'd',  b'f',  b'g',  b'h',  b'j',  b'k',  b'l',  b';',  // 0x20
    b'\'', b'`',  NO,    b'\\', b'z',  b'x',  b'c',  b'v',
    b'b',  b'n',  b'm',  b',',  b'.',  b'/',  NO,    b'*',  // 0x30
    NO,    b' ',  NO,    NO,    NO,    NO,    NO,    NO,
    NO,    NO,    NO,    NO,    NO,    NO,    NO,    b'7',  // 0x40
    b'8',  b'9',  b'-',  b'4',  b'5',  b'6',  b'+',  b'1',
    b'2',  b'3',  b'0',  b'.',  NO,    NO,    NO,    NO,    // 0x50
];

#[rustfmt::skip]
const SHIFTED: [u8; 0x58] = [
    NO,    0x1B,  b'!',  b'@',  b'#',  b'$',  b'%',  b'^',  // 0x00
    b'&',  b'*',  b'(',  b')',  b'_',  b'+',  0x08,  b'\t',
    b'Q',  b'W',  b'E',  b'R',  b'T',  b'Y',  b'U',  b'I',  // 0x10
    b'O',  b'P',  b'{',  b'}',  b'\n', NO,    b'A',  b'S',
    b'D',  b'F',  b'G',  b'H',  b'J',  b'K',  b'L',  b':',  // 0x20
    b'"',  b'~',  NO,    b'|',  b'Z',  b'X',  b'C',  b'V',
    b'B',  b'N',  b'M',  b'<',  b'>',  b'?',  NO,    b'*',  // 0x30
    NO,    b' ',  NO,    NO,    NO,    NO,    NO,    NO,
    NO,    NO,    NO,    NO,    NO,    NO,    NO,    b'7',  // 0x40
    b'8',  b'9',  b'-',  b'4',  b'5',  b'6',  b'+',  b'1',
    b'2',  b'3',  b'0',  b'.',  NO,    NO,    NO,    NO,    // 0x50
];

#[rustfmt::skip]
const CONTROL: [u8; 0x38] = [
    NO,       NO,       NO,       NO,       NO,       NO,       NO,       NO,
    NO,       NO,       NO,       NO,       NO,       NO,       NO,       NO,
    ctrl(b'Q'), ctrl(b'W'), ctrl(b'E'), ctrl(b'R'), ctrl(b'T'), ctrl(b'Y'), ctrl(b'U'), ctrl(b'I'),
    ctrl(b'O'), ctrl(b'P'), NO,   NO,       b'\r',    NO,       ctrl(b'A'), ctrl(b'S'),
    ctrl(b'D'), ctrl(b'F'), ctrl(b'G'), ctrl(b'H'), ctrl(b'J'), ctrl(b'K'), ctrl(b'L'), NO,
    NO,       NO,       NO,       ctrl(b'\\'), ctrl(b'Z'), ctrl(b'X'), ctrl(b'C'), ctrl(b'V'),
    ctrl(b'B'), ctrl(b'N'), ctrl(b'M'), NO, NO,     NO,       NO,       NO,
];

/// Expand a table prefix to all 256 codes and add the E0-prefixed keys
const fn keymap(prefix: &[u8], kp_enter: u8, kp_div: u8) -> [u8; 256] {
    let mut map = [NO; 256];
    let mut i = 0;
    while i < prefix.len() {
        map[i] = prefix[i];
        i += 1;
    }
    map[0x9C] = kp_enter;
    map[0xB5] = kp_div;
    map[0xC7] = KEY_HOME;
    map[0xC8] = KEY_UP;
    map[0xC9] = KEY_PGUP;
    map[0xCB] = KEY_LF;
    map[0xCD] = KEY_RT;
    map[0xCF] = KEY_END;
    map[0xD0] = KEY_DN;
    map[0xD1] = KEY_PGDN;
    map[0xD2] = KEY_INS;
    map[0xD3] = KEY_DEL;
    map
}

static NORMAL_MAP: [u8; 256] = keymap(&NORMAL, b'\n', b'/');
static SHIFT_MAP: [u8; 256] = keymap(&SHIFTED, b'\n', b'/');
static CTL_MAP: [u8; 256] = keymap(&CONTROL, b'\r', NO);

/// Keymap by `shift & (CTL | SHIFT)`
static CHARCODE: [&[u8; 256]; 4] = [&NORMAL_MAP, &SHIFT_MAP, &CTL_MAP, &CTL_MAP];

/// Modifier bits held while a key is down
const fn shiftcode(data: u8) -> u8 {
    match data {
        0x1D | 0x9D => CTL,
        0x2A | 0x36 => SHIFT,
        0x38 | 0xB8 => ALT,
        _ => 0,
    }
}

/// Lock bits flipped on each press
const fn togglecode(data: u8) -> u8 {
    match data {
        0x3A => CAPSLOCK,
        0x45 => NUMLOCK,
        0x46 => SCROLLLOCK,
        _ => 0,
    }
}

/// Scan code decoder state
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyboard {
    shift: u8,
}

impl Keyboard {
    pub const fn new() -> Self {
        Self { shift: 0 }
    }

    /// Feed one scan code byte; returns the input code, or 0 for bytes that
    /// only change state (prefixes, releases, modifiers, unmapped keys)
    pub fn decode(&mut self, data: u8) -> u8 {
        let mut data = data;
        if data == E0 {
            self.shift |= E0ESC;
            return 0;
        }
        if data & RELEASE != 0 {
            let key = if self.shift & E0ESC != 0 { data } else { data & !RELEASE };
            self.shift &= !(shiftcode(key) | E0ESC);
            return 0;
        }
        if self.shift & E0ESC != 0 {
            // Extended keys live in the upper half of the maps
            data |= RELEASE;
            self.shift &= !E0ESC;
        }

        self.shift |= shiftcode(data);
        self.shift ^= togglecode(data);

        let c = CHARCODE[(self.shift & (CTL | SHIFT)) as usize][data as usize];
        if self.shift & CAPSLOCK != 0 {
            if c.is_ascii_lowercase() {
                return c.to_ascii_uppercase();
            } else if c.is_ascii_uppercase() {
                return c.to_ascii_lowercase();
            }
        }
        c
    }

    /// Poll the controller: `None` once its output buffer is empty
    pub fn getc<A: Architecture + ?Sized>(&mut self, arch: &A) -> Option<u8> {
        if arch.inb(KBSTATP) & KBS_DIB == 0 {
            return None;
        }
        let data = arch.inb(KBDATAP);
        Some(self.decode(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHardware;

    fn decode_all(kbd: &mut Keyboard, codes: &[u8]) -> Vec<u8> {
        codes
            .iter()
            .map(|&c| kbd.decode(c))
            .filter(|&c| c != 0)
            .collect()
    }

    #[test]
    fn test_plain_keys() {
        let mut kbd = Keyboard::new();
        // h, i, Enter with releases
        assert_eq!(decode_all(&mut kbd, &[0x23, 0xA3, 0x17, 0x97, 0x1C, 0x9C]), b"hi\n");
        assert_eq!(decode_all(&mut kbd, &[0x02, 0x0E, 0x39]), [b'1', 0x08, b' ']);
    }

    #[test]
    fn test_shift_is_held_until_release() {
        let mut kbd = Keyboard::new();
        // LShift down, a, 1, LShift up, a
        assert_eq!(decode_all(&mut kbd, &[0x2A, 0x1E, 0x02, 0xAA, 0x1E]), b"A!a");
    }

    #[test]
    fn test_control_codes() {
        let mut kbd = Keyboard::new();
        // Ctrl down, d, u, p, Ctrl up
        assert_eq!(
            decode_all(&mut kbd, &[0x1D, 0x20, 0x16, 0x19, 0x9D]),
            [ctrl(b'D'), ctrl(b'U'), ctrl(b'P')]
        );
    }

    #[test]
    fn test_caps_lock_toggles() {
        let mut kbd = Keyboard::new();
        assert_eq!(decode_all(&mut kbd, &[0x3A, 0xBA, 0x1E]), b"A");
        // Shift inverts caps lock
        assert_eq!(decode_all(&mut kbd, &[0x2A, 0x1E, 0xAA]), b"a");
        // Digits are unaffected
        assert_eq!(decode_all(&mut kbd, &[0x02]), b"1");
        assert_eq!(decode_all(&mut kbd, &[0x3A, 0xBA, 0x1E]), b"a");
    }

    #[test]
    fn test_extended_keys() {
        let mut kbd = Keyboard::new();
        let codes = [
            E0, 0x4B, E0, 0xCB, // left
            E0, 0x4D, E0, 0xCD, // right
            E0, 0x48, E0, 0xC8, // up
            E0, 0x50, E0, 0xD0, // down
            E0, 0x47, E0, 0x53, // home, delete
            E0, 0x1C, // keypad enter
        ];
        assert_eq!(
            decode_all(&mut kbd, &codes),
            [KEY_LF, KEY_RT, KEY_UP, KEY_DN, KEY_HOME, KEY_DEL, b'\n']
        );
    }

    #[test]
    fn test_right_ctrl_release() {
        let mut kbd = Keyboard::new();
        // Right Ctrl is E0 1D / E0 9D
        assert_eq!(decode_all(&mut kbd, &[E0, 0x1D, 0x20, E0, 0x9D, 0x20]), [ctrl(b'D'), b'd']);
    }

    #[test]
    fn test_getc_polls_status() {
        let hw = MockHardware::new();
        let mut kbd = Keyboard::new();
        assert_eq!(kbd.getc(&hw), None);

        hw.push_scancodes(&[0x2A, 0x23]);
        assert_eq!(kbd.getc(&hw), Some(0));
        assert_eq!(kbd.getc(&hw), Some(b'H'));
        assert_eq!(kbd.getc(&hw), None);
    }
}
