use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

/// Cyrillic letters and their Latin spelling, used to keep header values
/// readable once non-ASCII characters are stripped.
#[rustfmt::skip]
const CYRILLIC_TO_LATIN: [(char, &str); 66] = [
    ('А', "A"), ('а', "a"), ('Б', "B"), ('б', "b"), ('В', "V"), ('в', "v"),
    ('Г', "G"), ('г', "g"), ('Д', "D"), ('д', "d"), ('Е', "E"), ('е', "e"),
    ('Ё', "E"), ('ё', "e"), ('Ж', "Zh"), ('ж', "zh"), ('З', "Z"), ('з', "z"),
    ('И', "I"), ('и', "i"), ('Й', "Y"), ('й', "y"), ('К', "K"), ('к', "k"),
    ('Л', "L"), ('л', "l"), ('М', "M"), ('м', "m"), ('Н', "N"), ('н', "n"),
    ('О', "O"), ('о', "o"), ('П', "P"), ('п', "p"), ('Р', "R"), ('р', "r"),
    ('С', "S"), ('с', "s"), ('Т', "T"), ('т', "t"), ('У', "U"), ('у', "u"),
    ('Ф', "F"), ('ф', "f"), ('Х', "Kh"), ('х', "kh"), ('Ц', "Ts"), ('ц', "ts"),
    ('Ч', "Ch"), ('ч', "ch"), ('Ш', "Sh"), ('ш', "sh"), ('Щ', "Shch"), ('щ', "shch"),
    ('Ы', "Y"), ('ы', "y"), ('Э', "E"), ('э', "e"), ('Ю', "Yu"), ('ю', "yu"),
    ('Я', "Ya"), ('я', "ya"), ('Ь', ""), ('ь', ""), ('Ъ', ""), ('ъ', ""),
];

pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match CYRILLIC_TO_LATIN.iter().find(|(cyr, _)| *cyr == c) {
            Some((_, latin)) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// Makes a value safe for an HTTP header: transliterates Cyrillic, then drops
/// everything outside printable ASCII (`' '..='~'`).
pub fn sanitize_header_value(text: &str) -> String {
    transliterate(text)
        .chars()
        .filter(|c| (' '..='~').contains(c))
        .collect()
}

/// Name offered to the client for a downloaded track.
pub fn download_filename(song: &str, artist: &str) -> String {
    format!("{song}-{artist}.mp3")
}

/// Download filename that is also safe as a local path component.
pub fn local_filename(song: &str, artist: &str) -> String {
    let name = sanitize_header_value(&download_filename(song, artist));
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// `floor(progress / duration * 100)`, clamped to `0..=100`. A zero duration
/// yields 0.
pub fn progress_percentage(progress_ms: u64, duration_ms: u64) -> u8 {
    if duration_ms == 0 {
        return 0;
    }
    let pct = (u128::from(progress_ms) * 100) / u128::from(duration_ms);
    pct.min(100) as u8
}

/// 128 random bits as 32 lowercase hex digits.
pub fn random_file_stem() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}

/// Value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Formats a millisecond offset as `m:ss.cc`.
pub fn format_timestamp(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{minutes}:{seconds:02}.{centis:02}")
}

/// RFC 5987 encoding for `filename*` parameters.
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
