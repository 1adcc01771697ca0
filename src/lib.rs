/*!
# LeafXML

A decoder for a restricted subset of XML 1.0/1.1: namespace processing
is folded into the core, element/attribute names and text are
normalized to Unicode NFC, and arcane features (embedded DTDs,
non-Unicode encodings, XML 1.1's archaic control-character escapes) are
dropped. The crate exposes a pull-style event API — element start,
element end, content text — over [`Parser`].

## Example

```
use leafxml::{Parser, EventKind};

let mut p = Parser::new("<greeting>hello</greeting>").unwrap();
while p.read_event().unwrap() {
    match p.event_kind().unwrap() {
        EventKind::Start => println!("start: {}", p.element_name().unwrap()),
        EventKind::Text => println!("text: {}", p.content_text().unwrap()),
        EventKind::End => println!("end"),
    }
}
```

## Restrictions (by design, not limitations)

* No DTD interpretation or external entity resolution.
* No schema validation.
* Comments, processing instructions, and DOCTYPE are recognized only
  well enough to be discarded; they never reach the event stream.
* Only UTF-8 and UTF-16 (with BOM) input encodings.
* Names and text are normalized to NFC, which is a deliberate reversal
  of XML 1.0's prohibition on input normalization.
*/
mod entities;
mod error;
pub mod lexer;
mod namespaces;
mod selectors;
mod tag;
mod text;

mod parser;


pub use error::{CallerError, ParseError, ParseErrorKind, Result};
pub use lexer::{Token, TokenKind, Tokenizer};
pub use namespaces::{XMLNS_NAMESPACE, XML_NAMESPACE};
pub use parser::{EventKind, Parser};
