//! Identifier casing for option strings such as npm package names

/// Turn an option like `@unocss/preset-web-fonts` into `presetWebFonts`
///
/// Takes the last `/` segment, splits it on non-alphanumeric characters,
/// lower-cases the first part and upper-cases the initial of every later
/// part.
pub fn identifier_for(option: &str) -> String {
    let segment = option.rsplit('/').next().unwrap_or(option);
    let mut parts = segment
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| !p.is_empty());

    let mut ident = String::with_capacity(segment.len());
    if let Some(first) = parts.next() {
        ident.push_str(&first.to_lowercase());
    }
    for part in parts {
        let mut chars = part.chars();
        if let Some(initial) = chars.next() {
            ident.extend(initial.to_uppercase());
            ident.push_str(chars.as_str());
        }
    }
    ident
}
