//! Russian Cyrillic to Latin romanization used for the second geocoding attempt.

fn latin_for(lower: char) -> Option<&'static str> {
    let s = match lower {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "'",
        'ы' => "y",
        'э' => "e",
        'ю' => "ju",
        'я' => "ja",
        _ => return None,
    };
    Some(s)
}

/// Romanize Russian text. Characters outside the Russian alphabet are kept as is,
/// so Latin input comes back unchanged.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        let Some(latin) = latin_for(lower) else {
            out.push(ch);
            continue;
        };

        if ch == lower {
            out.push_str(latin);
            continue;
        }

        // Upper case: capitalise only the first letter of digraphs (Ж -> Zh).
        let mut chars = latin.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}
