use time::{macros::format_description, OffsetDateTime};

/// A value bound to a `$N` placeholder while building a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Text(String),
    Timestamp(OffsetDateTime),
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl SqlArg {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Float(_) => "float",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LiteralError {
    #[error("error formatting value at index {index}: unsupported type for argument ({kind})")]
    UnsupportedLiteralType { index: usize, kind: &'static str },
    #[error("error formatting value at index {index}: {source}")]
    Timestamp {
        index: usize,
        #[source]
        source: time::error::Format,
    },
    #[error("placeholder ${placeholder} has no bound argument ({available} available)")]
    MissingArgument { placeholder: usize, available: usize },
    #[error("placeholder ${digits} is out of range")]
    PlaceholderOverflow { digits: String },
}

/// Render one argument as a literal.
///
/// - text: single-quoted, embedded `'` doubled
/// - timestamp: `'YYYY-MM-DD HH:MM:SS'`, no offset suffix
/// - float: six digits after the decimal point
pub fn render_literal(index: usize, arg: &SqlArg) -> Result<String, LiteralError> {
    match arg {
        SqlArg::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        SqlArg::Timestamp(ts) => {
            let rendered = ts
                .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
                .map_err(|source| LiteralError::Timestamp { index, source })?;
            Ok(format!("'{rendered}'"))
        }
        SqlArg::Float(v) => Ok(format!("{v:.6}")),
        other => Err(LiteralError::UnsupportedLiteralType {
            index,
            kind: other.kind(),
        }),
    }
}

/// Replace every `$N` placeholder in `sql` with the rendered literal of `args[N - 1]`.
///
/// The template is scanned once, so text spliced in from one argument is never
/// mistaken for a later placeholder.
pub fn inline_args(sql: &str, args: &[SqlArg]) -> Result<String, LiteralError> {
    let rendered = args
        .iter()
        .enumerate()
        .map(|(i, arg)| render_literal(i, arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = String::with_capacity(sql.len() + rendered.iter().map(String::len).sum::<usize>());
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let placeholder: usize = after[..digits]
            .parse()
            .map_err(|_| LiteralError::PlaceholderOverflow {
                digits: after[..digits].to_string(),
            })?;
        let literal = placeholder
            .checked_sub(1)
            .and_then(|i| rendered.get(i))
            .ok_or(LiteralError::MissingArgument {
                placeholder,
                available: args.len(),
            })?;
        out.push_str(literal);
        rest = &after[digits..];
    }
    out.push_str(rest);

    Ok(out)
}
