//! Template-related functionality: inline includes of JavaScript fragments,
//! and the driver template that turns a structured contact summary
//! definition into a program.

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use handlebars::Handlebars;
use lazy_static::lazy_static;
use log::debug;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::fs::read_to_string;
use crate::Error;

lazy_static! {
    static ref INCLUDE_PATTERN: Regex =
        Regex::new(r#"__include_inline__\(\s*['"]([^'"]*)['"]\s*\);?"#).unwrap();
}

/// Reads the given file and expands any includes within it. See
/// [`expand_includes`].
pub fn expand_file<P1, P2>(base_dir: P1, path: P2) -> Result<String>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let mut stack = Vec::new();
    include_file(base_dir.as_ref(), path.as_ref(), &mut stack)
}

/// Replaces every `__include_inline__('some/file.js');` in `source` with the
/// content of that file, relative to `base_dir`. Included files may include
/// other files.
pub fn expand_includes<P: AsRef<Path>>(base_dir: P, source: &str) -> Result<String> {
    let mut stack = Vec::new();
    expand(base_dir.as_ref(), source, &mut stack)
}

fn expand(base_dir: &Path, source: &str, stack: &mut Vec<PathBuf>) -> Result<String> {
    let mut failure = None;
    let expanded = INCLUDE_PATTERN.replace_all(source, |caps: &Captures| {
        if failure.is_some() {
            return String::new();
        }
        match include_file(base_dir, &base_dir.join(&caps[1]), stack) {
            Ok(content) => content,
            Err(e) => {
                failure = Some(e);
                String::new()
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn include_file(base_dir: &Path, path: &Path, stack: &mut Vec<PathBuf>) -> Result<String> {
    if stack.iter().any(|included| included == path) {
        return Err(Error::IncludeCycle(path.to_path_buf()).into());
    }
    debug!("Including {}", path.display());
    let content = read_to_string(path).wrap_err_with(|| Error::TemplateInclude(path.to_path_buf()))?;
    stack.push(path.to_path_buf());
    let expanded = expand(base_dir, &content, stack);
    stack.pop();
    expanded
}

/// The program that wraps a structured contact summary definition.
///
/// It expects the included files to assign `fields` and `cards` (and
/// optionally `context`), and returns `{cards, fields, context}`.
const DRIVER_TEMPLATE: &str = r#"
var context, fields, cards;

__include_inline__('{{extras}}');
__include_inline__('{{definition}}');

function isReportValid(report) {
  // valid XForms won't have .errors field
  // valid JSON forms will have empty array errors:[]
  return report && !(report.errors && report.errors.length);
}

var result = {
  cards: [],
  fields: fields.filter(function(f) {
    if(f.appliesToType === contact.type ||
        (f.appliesToType.charAt(0) === '!' && f.appliesToType.slice(1) !== contact.type)) {
      if(!f.appliesIf || f.appliesIf()) {
        delete f.appliesToType;
        delete f.appliesIf;
        return true;
      }
    }
    return false;
  })
};

function addCard(card, r) {
  if(!card.appliesIf(r)) {
    return;
  }

  function addValue(src, dst, prop) {
    switch(typeof src[prop]) {
      case 'undefined': return;
      case 'function': dst[prop] = src[prop](r); break;
      default: dst[prop] = src[prop];
    }
  }

  var fields = typeof card.fields === 'function' ?
      card.fields(r) :
      card.fields
        .filter(function(f) {
          switch(typeof f.appliesIf) {
            case 'undefined': return true;
            case 'function': return f.appliesIf(r);
            default: return f.appliesIf;
          }
        })
        .map(function(f) {
          var ret = {};
          addValue(f, ret, 'label');
          addValue(f, ret, 'value');
          addValue(f, ret, 'translate');
          addValue(f, ret, 'filter');
          addValue(f, ret, 'width');
          addValue(f, ret, 'icon');
          if(f.context) {
            ret.context = {};
            addValue(f.context, ret.context, 'count');
            addValue(f.context, ret.context, 'total');
          }
          return ret;
        });

  result.cards.push({
    label: card.label,
    fields: fields
  });

  if(card.modifyContext) {
    card.modifyContext(context, r);
  }
}

cards.forEach(function(card) {
  var idx, r;
  switch(card.appliesToType) {
    case '{{report_card}}':
      for(idx = 0; idx < reports.length; ++idx) {
        r = reports[idx];
        if(!isReportValid(r)) {
          continue;
        }
        addCard(card, r);
      }
      break;
    default:
      if(contact.type !== card.appliesToType) {
        return;
      }
      addCard(card);
  }
});

result.context = context;

return result;
"#;

#[derive(Debug, Serialize)]
struct DriverParams<'a> {
    extras: &'a str,
    definition: &'a str,
    report_card: &'a str,
}

/// Renders the driver program for a structured contact summary, whose
/// definition lives in the file `definition`, preceded by helpers from the
/// file `extras` (both relative to the project directory). Includes are not
/// yet expanded in the result.
pub fn render_driver(extras: &str, definition: &str) -> Result<String> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("driver", DRIVER_TEMPLATE)
        .map_err(Error::Template)?;
    let params = DriverParams {
        extras,
        definition,
        report_card: crate::summary::REPORT_CARD,
    };
    Ok(hb
        .render("driver", &params)
        .map_err(|e| Error::TemplateRender("driver".to_string(), e))?)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn includes_are_expanded_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "var a = 1;\n__include_inline__(\"lib/b.js\")\n").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/b.js"), "var b = 2;").unwrap();
        let expanded =
            expand_includes(dir.path(), "__include_inline__( 'a.js' );\nreturn a + b;").unwrap();
        assert_eq!(expanded, "var a = 1;\nvar b = 2;\n\nreturn a + b;");
    }

    #[test]
    fn missing_include_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_includes(dir.path(), "__include_inline__('nope.js');").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::TemplateInclude(path)) => assert!(path.ends_with("nope.js")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn include_cycles_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "__include_inline__('b.js');").unwrap();
        fs::write(dir.path().join("b.js"), "__include_inline__('a.js');").unwrap();
        let err = expand_file(dir.path(), dir.path().join("a.js")).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::IncludeCycle(path)) => assert!(path.ends_with("a.js")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn driver_includes_both_files_in_order() {
        let driver = render_driver("extras.js", "definition.js").unwrap();
        let extras = driver.find("__include_inline__('extras.js');").unwrap();
        let definition = driver.find("__include_inline__('definition.js');").unwrap();
        assert!(extras < definition);
        assert!(driver.contains("case 'report':"));
    }
}
