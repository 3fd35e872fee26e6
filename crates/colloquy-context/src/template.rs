/// Replace every `{key}` in `template` with its value.
///
/// Substitution is literal and single-pass: text produced by one
/// replacement is never scanned again, so values containing `{...}` are
/// inserted verbatim. Placeholders without a value are left untouched.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let replacement = candidate.find('}').and_then(|close| {
            let key = &candidate[1..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close + 1))
        });

        match replacement {
            Some((value, consumed)) => {
                output.push_str(value);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('{');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}
