#[macro_export]
macro_rules! regex {
    ($pat:expr) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

#[macro_export]
macro_rules! fregex {
    ($pat:expr) => {{
        static RE: once_cell::sync::Lazy<fancy_regex::Regex> =
            once_cell::sync::Lazy::new(|| fancy_regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rule_opt {
    () => {
        None
    };
    ($value:expr) => {
        Some($value)
    };
}

#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        order: $order:expr
        $(, quality: $quality:expr)?
        $(, match: $matcher:expr)?
        $(, parse: $parse:expr)?
        $(, html: $html:expr)?
        $(, element: $element:expr)?
        $(, html_join: $html_join:expr)?
        $(, element_join: $element_join:expr)?
        $(,)?
    ) => {{
        $crate::Rule {
            name: $name,
            order: $order,
            quality: $crate::__rule_opt!($($quality)?),
            matcher: $crate::__rule_opt!($($matcher)?),
            parse: $crate::__rule_opt!($($parse)?),
            html: $crate::__rule_opt!($($html)?),
            element: $crate::__rule_opt!($($element)?),
            html_join: $crate::__rule_opt!($($html_join)?),
            element_join: $crate::__rule_opt!($($element_join)?),
        }
    }};
}
