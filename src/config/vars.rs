use std::{collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

// Names are restricted to `[:word:]` plus `.`, which is what shells and Java property style
// variables use in practice.
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \$\$|
        \$([[:word:].]+)|
        \$\{([[:word:].]+)(?:(:?-|:?\?)([^}]*))?\}",
    )
    .expect("invalid regex")
});

/// Replaces `$NAME` and `${NAME}` references in `input` with values from `vars`.
///
/// Supports the shell forms `${NAME:-default}`, `${NAME-default}`, `${NAME:?message}` and
/// `${NAME?message}`; `$$` escapes a literal dollar sign. Returns the interpolated text with
/// warnings for unset variables, or every required-variable error found.
pub(super) fn interpolate(
    input: &str,
    vars: &HashMap<String, String>,
) -> Result<(String, Vec<String>), Vec<String>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let interpolated = VARIABLE
        .replace_all(input, |caps: &Captures<'_>| {
            let Some(name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                return "$".to_string();
            };
            let flags = caps.get(3).map_or("", |m| m.as_str());
            let fallback = caps.get(4).map_or("", |m| m.as_str());
            let value = vars.get(name).map(String::as_str);

            let resolved = match flags {
                ":-" => value.filter(|v| !v.is_empty()).unwrap_or(fallback),
                "-" => value.unwrap_or(fallback),
                ":?" => value.filter(|v| !v.is_empty()).unwrap_or_else(|| {
                    errors.push(format!(
                        "Non-empty env var required in config. name = {name:?}, error = {fallback:?}"
                    ));
                    ""
                }),
                "?" => value.unwrap_or_else(|| {
                    errors.push(format!(
                        "Missing env var required in config. name = {name:?}, error = {fallback:?}"
                    ));
                    ""
                }),
                _ => value.unwrap_or_else(|| {
                    warnings.push(format!("Unknown env var in config. name = {name:?}"));
                    ""
                }),
            };
            resolved.to_string()
        })
        .into_owned();

    if errors.is_empty() {
        Ok((interpolated, warnings))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod test {
    use super::interpolate;

    #[test]
    fn interpolation() {
        let vars = vec![
            ("REGION".into(), "us-east-1".into()),
            ("REGION_2".into(), "eu-west-1".into()),
            ("AWS.KEY".into(), "secret".into()),
            ("EMPTY".into(), "".into()),
        ]
        .into_iter()
        .collect();

        assert_eq!("us-east-1", interpolate("$REGION", &vars).unwrap().0);
        assert_eq!("us-east-1", interpolate("${REGION}", &vars).unwrap().0);
        assert_eq!("xeu-west-1y", interpolate("x${REGION_2}y", &vars).unwrap().0);
        assert_eq!("x", interpolate("x$REGIONy", &vars).unwrap().0);
        assert_eq!("$ x", interpolate("$ x", &vars).unwrap().0);
        assert_eq!("$REGION", interpolate("$$REGION", &vars).unwrap().0);
        assert_eq!("secret", interpolate("$AWS.KEY", &vars).unwrap().0);
        assert_eq!("${}", interpolate("${}", &vars).unwrap().0);
        assert_eq!("us-east-1", interpolate("${REGION:-x}", &vars).unwrap().0);
        assert_eq!("1m", interpolate("${PERIOD:-1m}", &vars).unwrap().0);
        assert_eq!("1m", interpolate("${EMPTY:-1m}", &vars).unwrap().0);
        assert_eq!("", interpolate("${EMPTY-1m}", &vars).unwrap().0);
        assert_eq!("", interpolate("${EMPTY?missing}", &vars).unwrap().0);
        assert!(interpolate("${NOT:?missing}", &vars).is_err());
        assert!(interpolate("${NOT?missing}", &vars).is_err());
        assert!(interpolate("${EMPTY:?missing}", &vars).is_err());
    }

    #[test]
    fn unknown_variable_warns() {
        let (output, warnings) = interpolate("region = \"$NOPE\"", &Default::default()).unwrap();

        assert_eq!(output, "region = \"\"");
        assert_eq!(warnings.len(), 1);
    }
}
