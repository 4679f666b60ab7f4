//! # Substitution Tables
//!
//! Character substitutions applied by the sanitizer. Three tables are
//! combined:
//!
//! - **Accents**: letters with diacritics mapped to their plain Latin letter.
//!   These are the only substitutions suppressed inside URLs.
//! - **Whitespace**: C0/C1 controls and Unicode space variants mapped to an
//!   ASCII space. U+0010 is absent on purpose, matching deployed hash
//!   generators.
//! - **Seven-bit**: extended Latin, Greek and symbol characters mapped to the
//!   closest character that fits a 7-bit SMS alphabet, `?` when nothing fits.
//!
//! Every replacement character is a fixed point of the combined table, so
//! applying it twice equals applying it once.
//!
//! One entry departs from the tables deployed handsets use: they map `ç` to
//! `Ç`, which is itself replaced on a second pass. Here `ç` maps straight to
//! `C` so sanitizing stays idempotent. Hashes of text containing `ç`
//! therefore differ from those a handset computes.

/// Accent substitutions, sorted by code point.
const ACCENTS: &[(char, char)] = &[
    ('Ä', 'A'),
    ('Å', 'A'),
    ('Ç', 'C'),
    ('É', 'E'),
    ('Ñ', 'N'),
    ('Ö', 'O'),
    ('Ø', 'O'),
    ('Ü', 'U'),
    ('à', 'a'),
    ('ä', 'a'),
    ('å', 'a'),
    ('è', 'e'),
    ('é', 'e'),
    ('ì', 'i'),
    ('ñ', 'n'),
    ('ò', 'o'),
    ('ö', 'o'),
    ('ø', 'o'),
    ('ù', 'u'),
    ('ü', 'u'),
];

/// Seven-bit translations, sorted by code point.
const SEVEN_BIT: &[(char, char)] = &[
    ('\u{60}', '\''),
    ('\u{A2}', 'c'),
    ('\u{A6}', '|'),
    ('\u{A8}', '"'),
    ('\u{A9}', 'c'),
    ('\u{AB}', '<'),
    ('\u{AC}', '-'),
    ('\u{AE}', 'R'),
    ('\u{AF}', '-'),
    ('\u{B0}', 'o'),
    ('\u{B1}', '?'),
    ('\u{B4}', '\''),
    ('\u{B6}', '?'),
    ('\u{B7}', '.'),
    ('\u{B8}', ','),
    ('\u{BB}', '>'),
    ('\u{C0}', 'A'),
    ('\u{C1}', 'A'),
    ('\u{C2}', 'A'),
    ('\u{C3}', 'A'),
    ('\u{C8}', 'E'),
    ('\u{CA}', 'E'),
    ('\u{CB}', 'E'),
    ('\u{CC}', 'I'),
    ('\u{CD}', 'I'),
    ('\u{CE}', 'I'),
    ('\u{CF}', 'I'),
    ('\u{D0}', 'D'),
    ('\u{D2}', 'O'),
    ('\u{D3}', 'O'),
    ('\u{D4}', 'O'),
    ('\u{D5}', 'O'),
    ('\u{D7}', 'x'),
    ('\u{D9}', 'U'),
    ('\u{DA}', 'U'),
    ('\u{DB}', 'U'),
    ('\u{DD}', 'Y'),
    ('\u{DE}', 'T'),
    ('\u{E1}', 'a'),
    ('\u{E2}', 'a'),
    ('\u{E3}', 'a'),
    // Handsets produce 'Ç' here.
    ('\u{E7}', 'C'),
    ('\u{EA}', 'e'),
    ('\u{EB}', 'e'),
    ('\u{ED}', 'i'),
    ('\u{EE}', 'i'),
    ('\u{EF}', 'i'),
    ('\u{F0}', 'd'),
    ('\u{F3}', 'o'),
    ('\u{F4}', 'o'),
    ('\u{F5}', 'o'),
    ('\u{F7}', '/'),
    ('\u{FA}', 'u'),
    ('\u{FB}', 'u'),
    ('\u{FD}', 'y'),
    ('\u{FE}', 't'),
    ('\u{FF}', 'y'),
    ('\u{100}', 'A'),
    ('\u{101}', 'a'),
    ('\u{102}', 'A'),
    ('\u{103}', 'a'),
    ('\u{104}', 'A'),
    ('\u{105}', 'a'),
    ('\u{106}', 'C'),
    ('\u{107}', 'c'),
    ('\u{109}', 'c'),
    ('\u{10A}', 'C'),
    ('\u{10B}', 'c'),
    ('\u{10C}', 'C'),
    ('\u{10D}', 'c'),
    ('\u{10E}', 'D'),
    ('\u{10F}', 'd'),
    ('\u{110}', 'D'),
    ('\u{111}', 'd'),
    ('\u{112}', 'E'),
    ('\u{113}', 'e'),
    ('\u{114}', 'E'),
    ('\u{115}', 'e'),
    ('\u{116}', 'E'),
    ('\u{117}', 'e'),
    ('\u{118}', 'E'),
    ('\u{119}', 'e'),
    ('\u{11A}', 'E'),
    ('\u{11B}', 'e'),
    ('\u{11C}', 'G'),
    ('\u{11D}', 'g'),
    ('\u{11E}', 'G'),
    ('\u{11F}', 'g'),
    ('\u{120}', 'G'),
    ('\u{121}', 'g'),
    ('\u{122}', 'G'),
    ('\u{123}', 'g'),
    ('\u{124}', 'H'),
    ('\u{125}', 'h'),
    ('\u{126}', 'H'),
    ('\u{127}', 'h'),
    ('\u{128}', 'I'),
    ('\u{129}', 'i'),
    ('\u{12A}', 'I'),
    ('\u{12B}', 'i'),
    ('\u{12C}', 'I'),
    ('\u{12D}', 'i'),
    ('\u{12E}', 'I'),
    ('\u{12F}', 'i'),
    ('\u{130}', 'I'),
    ('\u{131}', 'i'),
    ('\u{132}', 'I'),
    ('\u{133}', 'j'),
    ('\u{134}', 'J'),
    ('\u{135}', 'j'),
    ('\u{136}', 'K'),
    ('\u{137}', 'k'),
    ('\u{138}', 'k'),
    ('\u{139}', 'L'),
    ('\u{13A}', 'l'),
    ('\u{13B}', 'L'),
    ('\u{13C}', 'l'),
    ('\u{13D}', 'L'),
    ('\u{13E}', 'l'),
    ('\u{13F}', 'L'),
    ('\u{140}', 'l'),
    ('\u{141}', 'L'),
    ('\u{142}', 'l'),
    ('\u{143}', 'N'),
    ('\u{144}', 'n'),
    ('\u{145}', 'N'),
    ('\u{146}', 'n'),
    ('\u{147}', 'N'),
    ('\u{148}', 'n'),
    ('\u{149}', 'n'),
    ('\u{14A}', 'N'),
    ('\u{14B}', 'n'),
    ('\u{14C}', 'O'),
    ('\u{14D}', 'o'),
    ('\u{14E}', 'O'),
    ('\u{14F}', 'o'),
    ('\u{150}', 'O'),
    ('\u{151}', 'o'),
    ('\u{152}', 'O'),
    ('\u{153}', 'o'),
    ('\u{154}', 'R'),
    ('\u{155}', 'r'),
    ('\u{156}', 'R'),
    ('\u{157}', 'r'),
    ('\u{158}', 'R'),
    ('\u{159}', 'r'),
    ('\u{15A}', 'S'),
    ('\u{15B}', 's'),
    ('\u{15C}', 'S'),
    ('\u{15D}', 's'),
    ('\u{15E}', 'S'),
    ('\u{15F}', 's'),
    ('\u{160}', 'S'),
    ('\u{161}', 's'),
    ('\u{162}', 'T'),
    ('\u{163}', 't'),
    ('\u{164}', 'T'),
    ('\u{165}', 't'),
    ('\u{166}', 'T'),
    ('\u{167}', 't'),
    ('\u{168}', 'U'),
    ('\u{169}', 'u'),
    ('\u{16A}', 'U'),
    ('\u{16B}', 'u'),
    ('\u{16E}', 'U'),
    ('\u{16F}', 'u'),
    ('\u{170}', 'U'),
    ('\u{171}', 'u'),
    ('\u{172}', 'U'),
    ('\u{173}', 'u'),
    ('\u{174}', 'W'),
    ('\u{175}', 'w'),
    ('\u{176}', 'Y'),
    ('\u{177}', 'y'),
    ('\u{178}', 'Y'),
    ('\u{179}', 'Z'),
    ('\u{17A}', 'z'),
    ('\u{17B}', 'Z'),
    ('\u{17C}', 'z'),
    ('\u{17D}', 'Z'),
    ('\u{17E}', 'z'),
    ('\u{17F}', 'f'),
    ('\u{181}', 'B'),
    ('\u{18A}', 'D'),
    ('\u{18F}', 'E'),
    ('\u{192}', '?'),
    ('\u{198}', 'K'),
    ('\u{199}', 'k'),
    ('\u{1A0}', 'O'),
    ('\u{1A1}', 'o'),
    ('\u{1AF}', 'U'),
    ('\u{1B0}', 'u'),
    ('\u{1B3}', 'Y'),
    ('\u{1B4}', 'y'),
    ('\u{253}', 'b'),
    ('\u{257}', 'd'),
    ('\u{259}', 'e'),
    ('\u{2BB}', '\''),
    ('\u{2BC}', '\''),
    ('\u{2BD}', '\''),
    ('\u{2D9}', '\''),
    ('\u{2DD}', '"'),
    ('\u{37E}', ';'),
    ('\u{386}', 'A'),
    ('\u{387}', '.'),
    ('\u{388}', 'E'),
    ('\u{389}', 'H'),
    ('\u{38A}', 'I'),
    ('\u{38C}', 'O'),
    ('\u{38E}', 'Y'),
    ('\u{38F}', '\u{3A9}'),
    ('\u{390}', 'I'),
    ('\u{391}', 'A'),
    ('\u{392}', 'B'),
    ('\u{395}', 'E'),
    ('\u{396}', 'Z'),
    ('\u{397}', 'H'),
    ('\u{399}', 'I'),
    ('\u{39A}', 'K'),
    ('\u{39C}', 'M'),
    ('\u{39D}', 'N'),
    ('\u{39F}', 'O'),
    ('\u{3A1}', 'P'),
    ('\u{3A4}', 'T'),
    ('\u{3A5}', 'Y'),
    ('\u{3A7}', 'X'),
    ('\u{3AA}', 'I'),
    ('\u{3AB}', 'Y'),
    ('\u{3AC}', 'A'),
    ('\u{3AD}', 'E'),
    ('\u{3AE}', 'H'),
    ('\u{3AF}', 'I'),
    ('\u{3B0}', 'Y'),
    ('\u{3B1}', 'A'),
    ('\u{3B2}', 'B'),
    ('\u{3B3}', '\u{393}'),
    ('\u{3B4}', '\u{394}'),
    ('\u{3B5}', 'E'),
    ('\u{3B6}', 'Z'),
    ('\u{3B7}', 'H'),
    ('\u{3B8}', '\u{398}'),
    ('\u{3B9}', 'I'),
    ('\u{3BA}', 'K'),
    ('\u{3BB}', '\u{39B}'),
    ('\u{3BC}', 'M'),
    ('\u{3BD}', 'N'),
    ('\u{3BE}', '\u{39E}'),
    ('\u{3BF}', 'O'),
    ('\u{3C0}', '\u{3A0}'),
    ('\u{3C1}', 'P'),
    ('\u{3C2}', '\u{3A3}'),
    ('\u{3C3}', '\u{3A3}'),
    ('\u{3C4}', 'T'),
    ('\u{3C5}', 'Y'),
    ('\u{3C6}', '\u{3A6}'),
    ('\u{3C7}', 'X'),
    ('\u{3C8}', '\u{3A8}'),
    ('\u{3C9}', '\u{3A9}'),
    ('\u{3CA}', 'I'),
    ('\u{3CB}', 'Y'),
    ('\u{3CC}', 'O'),
    ('\u{3CD}', 'Y'),
    ('\u{3CE}', '\u{3A9}'),
    ('\u{1E62}', 'S'),
    ('\u{1E63}', 's'),
    ('\u{1EB8}', 'E'),
    ('\u{1EB9}', 'e'),
    ('\u{1ECA}', 'I'),
    ('\u{1ECB}', 'i'),
    ('\u{1ECC}', 'O'),
    ('\u{1ECD}', 'o'),
    ('\u{1EE4}', 'U'),
    ('\u{2010}', '-'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{201A}', '\''),
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
    ('\u{201E}', '"'),
    ('\u{2020}', '+'),
    ('\u{2021}', '+'),
    ('\u{2022}', '.'),
    ('\u{2026}', '.'),
    ('\u{2030}', '%'),
    ('\u{2039}', '<'),
    ('\u{203A}', '>'),
    ('\u{20A3}', '#'),
    ('\u{20A4}', '#'),
    ('\u{20B1}', '#'),
    ('\u{2122}', '?'),
    ('\u{221A}', '?'),
    ('\u{221E}', '?'),
    ('\u{2248}', '?'),
    ('\u{2260}', '?'),
    ('\u{2264}', '<'),
    ('\u{2265}', '>'),
];

fn lookup(table: &[(char, char)], c: char) -> Option<char> {
    table
        .binary_search_by_key(&c, |&(from, _)| from)
        .ok()
        .map(|idx| table[idx].1)
}

/// Whether `c` belongs to the whitespace substitution table.
pub fn is_table_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{F}'
            | '\u{11}'..='\u{1F}'
            | '\u{7F}'..='\u{A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200D}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{2060}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Whitespace as the sanitizer sees it: Unicode `White_Space` or a table entry.
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || is_table_whitespace(c)
}

/// Whether `c` is one of the accent letters kept verbatim inside URLs.
pub fn is_accent(c: char) -> bool {
    lookup(ACCENTS, c).is_some()
}

/// Substitution from the whitespace and seven-bit tables only.
pub fn plain_substitute(c: char) -> Option<char> {
    if is_table_whitespace(c) {
        return Some(' ');
    }
    lookup(SEVEN_BIT, c)
}

/// Substitution from the combined table.
pub fn substitute(c: char) -> Option<char> {
    lookup(ACCENTS, c).or_else(|| plain_substitute(c))
}
