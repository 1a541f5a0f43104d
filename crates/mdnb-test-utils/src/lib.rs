//! Testing utilities for mdnb workspace
//!
//! Shared markdown fixtures and document builders.

#![allow(missing_docs)]

use mdnb_document::{CodeCell, Document};

/// A readme in the shape most notebooks take
pub const README: &str = r#"# Runme

Shell commands in markdown.

```sh { name=install }
$ brew update
$ brew install runme
```

Then run a script:

```js { name=hello interactive=false }
console.log("Always bet on JS!")
```

```sh { name=deploy background=true }
deployctl deploy \
  --project=hello-world \
  ./main.ts
```
"#;

pub const WITH_FRONTMATTER: &str = r#"---
shell: bash
cwd: /tmp
category: setup
owner: platform-team
---

# Setup

```sh { name=setup-env }
export NAME=demo
```
"#;

/// Fences inside lists and quotes stay markup
pub const NESTED_FENCES: &str = r#"1. Install:

   ```sh
   npm install
   ```

> ```sh
> echo quoted
> ```
"#;

/// Body containing a fence of its own
pub const FENCE_IN_BODY: &str = "````md { name=example }\n```sh\nls\n```\n````\n";

pub const LEGACY_ANNOTATIONS: &str =
    "```sh { runme.dev/name=legacy runme.dev/id=abc123 }\necho legacy\n```\n";

pub const UNTERMINATED: &str = "# Broken\n\n```sh\nls\n";

/// Every fixture that parses
pub const VALID_FIXTURES: &[&str] = &[
    README,
    WITH_FRONTMATTER,
    NESTED_FENCES,
    FENCE_IN_BODY,
    LEGACY_ANNOTATIONS,
];

pub fn shell_cell(name: &str, body: &str) -> CodeCell {
    CodeCell::new(body, "sh").with_metadata("name", name)
}

pub fn create_test_document() -> Document {
    Document::new()
        .with_markup("# Test")
        .with_code(shell_cell("first", "echo one"))
        .with_markup("Between")
        .with_code(shell_cell("second", "echo two"))
}

/// Document with `count` unnamed shell cells holding the same text
pub fn create_duplicate_document(count: usize, body: &str) -> Document {
    (0..count).fold(Document::new(), |doc, _| {
        doc.with_code(CodeCell::new(body, "sh"))
    })
}
