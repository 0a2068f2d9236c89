//! Command facade over [`DaemonClient`].
//!
//! Each command builds its [`Query`] and unwraps the part of the response
//! its callers use. Degradation semantics come unchanged from the client.

use serde_json::Value;
use std::path::Path;

use crate::daemon::protocol::{Query, Response, SemanticAction, SliceDirection};
use crate::daemon::transport::QueryTransport;
use crate::daemon::DaemonClient;

/// Which part of a response a command hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// The response as-is, status included.
    Whole,
    /// The `result` envelope, or the whole response when it has none.
    Result,
    /// An array field, empty when absent.
    List(&'static str),
}

impl Consumed {
    pub fn of(query: &Query) -> Self {
        match query {
            Query::Search { .. } | Query::Semantic(SemanticAction::Search { .. }) => {
                Consumed::List("results")
            }
            Query::Impact { .. } => Consumed::List("callers"),
            Query::Imports { .. } => Consumed::List("imports"),
            Query::Ping
            | Query::Status
            | Query::Slice { .. }
            | Query::Warm { .. }
            | Query::Semantic(SemanticAction::Index { .. })
            | Query::Importers { .. } => Consumed::Whole,
            Query::Extract { .. }
            | Query::Dead { .. }
            | Query::Arch { .. }
            | Query::Cfg { .. }
            | Query::Dfg { .. }
            | Query::Calls { .. }
            | Query::Tree { .. }
            | Query::Structure { .. }
            | Query::Context { .. } => Consumed::Result,
        }
    }

    pub fn apply(self, response: &Response) -> Value {
        match self {
            Consumed::Whole => response.to_value(),
            Consumed::Result => response.result_or_whole(),
            Consumed::List(field) => Value::Array(response.array_field(field)),
        }
    }
}

impl<T: QueryTransport> DaemonClient<T> {
    pub async fn ping(&self, project: &Path) -> Response {
        self.query(&Query::Ping, project).await
    }

    pub async fn search(&self, pattern: &str, max_results: usize, project: &Path) -> Vec<Value> {
        let query = Query::Search {
            pattern: pattern.to_string(),
            max_results,
        };
        self.query(&query, project).await.array_field("results")
    }

    /// Callers of `func`.
    pub async fn impact(&self, func: &str, project: &Path) -> Vec<Value> {
        let query = Query::Impact {
            func: func.to_string(),
        };
        self.query(&query, project).await.array_field("callers")
    }

    pub async fn extract(&self, file: &str, project: &Path) -> Value {
        let query = Query::Extract {
            file: file.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn status(&self, project: &Path) -> Response {
        self.query(&Query::Status, project).await
    }

    pub async fn dead(&self, entry_points: &[String], language: &str, project: &Path) -> Value {
        let query = Query::Dead {
            entry_points: entry_points.to_vec(),
            language: language.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn arch(&self, language: &str, project: &Path) -> Value {
        let query = Query::Arch {
            language: language.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn cfg(&self, file: &str, function: &str, language: &str, project: &Path) -> Value {
        let query = Query::Cfg {
            file: file.to_string(),
            function: function.to_string(),
            language: language.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn dfg(&self, file: &str, function: &str, language: &str, project: &Path) -> Value {
        let query = Query::Dfg {
            file: file.to_string(),
            function: function.to_string(),
            language: language.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn slice(
        &self,
        file: &str,
        function: &str,
        line: u32,
        direction: SliceDirection,
        variable: Option<&str>,
        project: &Path,
    ) -> Response {
        let query = Query::Slice {
            file: file.to_string(),
            function: function.to_string(),
            line,
            direction,
            variable: variable.map(str::to_string),
        };
        self.query(&query, project).await
    }

    pub async fn calls(&self, language: &str, project: &Path) -> Value {
        let query = Query::Calls {
            language: language.to_string(),
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn warm(&self, language: &str, project: &Path) -> Response {
        let query = Query::Warm {
            language: language.to_string(),
        };
        self.query(&query, project).await
    }

    pub async fn semantic_search(&self, text: &str, k: usize, project: &Path) -> Vec<Value> {
        let query = Query::Semantic(SemanticAction::Search {
            query: text.to_string(),
            k,
        });
        self.query(&query, project).await.array_field("results")
    }

    pub async fn semantic_index(&self, language: &str, project: &Path) -> Response {
        let query = Query::Semantic(SemanticAction::Index {
            language: language.to_string(),
        });
        self.query(&query, project).await
    }

    pub async fn tree(&self, extensions: &[String], exclude_hidden: bool, project: &Path) -> Value {
        let query = Query::Tree {
            extensions: extensions.to_vec(),
            exclude_hidden,
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn structure(&self, language: &str, max_results: usize, project: &Path) -> Value {
        let query = Query::Structure {
            language: language.to_string(),
            max_results,
        };
        self.query(&query, project).await.result_or_whole()
    }

    /// Call context around `entry`, `depth` hops out.
    pub async fn context(&self, entry: &str, language: &str, depth: usize, project: &Path) -> Value {
        let query = Query::Context {
            entry: entry.to_string(),
            language: language.to_string(),
            depth,
        };
        self.query(&query, project).await.result_or_whole()
    }

    pub async fn imports(&self, file: &str, language: &str, project: &Path) -> Vec<Value> {
        let query = Query::Imports {
            file: file.to_string(),
            language: language.to_string(),
        };
        self.query(&query, project).await.array_field("imports")
    }

    pub async fn importers(&self, module: &str, language: &str, project: &Path) -> Response {
        let query = Query::Importers {
            module: module.to_string(),
            language: language.to_string(),
        };
        self.query(&query, project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(value: Value) -> Response {
        Response::from_value(value).unwrap()
    }

    #[test]
    fn test_consumed_per_command() {
        assert_eq!(
            Consumed::of(&Query::Search {
                pattern: "x".into(),
                max_results: 1
            }),
            Consumed::List("results")
        );
        assert_eq!(
            Consumed::of(&Query::Impact { func: "f".into() }),
            Consumed::List("callers")
        );
        assert_eq!(
            Consumed::of(&Query::Imports {
                file: "a.py".into(),
                language: "python".into()
            }),
            Consumed::List("imports")
        );
        assert_eq!(Consumed::of(&Query::Status), Consumed::Whole);
        assert_eq!(
            Consumed::of(&Query::Semantic(SemanticAction::Index {
                language: "python".into()
            })),
            Consumed::Whole
        );
        assert_eq!(
            Consumed::of(&Query::Arch {
                language: "python".into()
            }),
            Consumed::Result
        );
    }

    #[test]
    fn test_list_unwrap() {
        let response = ok(json!({"status": "ok", "results": ["a", "b"]}));
        assert_eq!(Consumed::List("results").apply(&response), json!(["a", "b"]));

        let response = ok(json!({"status": "ok"}));
        assert_eq!(Consumed::List("results").apply(&response), json!([]));

        let response = Response::Error {
            error: "timeout".into(),
        };
        assert_eq!(Consumed::List("callers").apply(&response), json!([]));
    }

    #[test]
    fn test_result_unwrap_passes_status_through() {
        let response = ok(json!({"status": "ok", "result": {"layers": []}}));
        assert_eq!(Consumed::Result.apply(&response), json!({"layers": []}));

        let response = Response::Indexing {
            message: "warming up".into(),
        };
        assert_eq!(
            Consumed::Result.apply(&response),
            json!({"status": "indexing", "message": "warming up"})
        );
    }
}
