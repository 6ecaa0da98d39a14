/*
 * producers/style.rs
 * Copyright (c) 2025 Posit, PBC
 */

use quarto_encoding::MediaType;

use crate::producer::{Discipline, Producer};

/// A filtered producer of CSS.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleProducer;

impl Producer for StyleProducer {
    fn discipline(&self) -> Discipline {
        Discipline::Filtered
    }

    fn content_type(&self) -> MediaType {
        MediaType::Css
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestScope;
    use crate::driver::run;
    use crate::producer::TextBody;

    #[test]
    fn test_style_in_xhtml() {
        let mut scope = RequestScope::new();
        let mut out = String::new();
        let mut body = TextBody::new("a > b { margin: 0 }\n");
        run(&mut StyleProducer, Some(&mut body), &mut scope, &mut out).unwrap();
        assert_eq!(
            out,
            "<style type=\"text/css\">/*<![CDATA[*/a > b { margin: 0 }/*]]>*/</style>"
        );
    }
}
