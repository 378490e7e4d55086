use super::SqlDataStore;
use super::rows::{self, CONTEXT_COLUMNS};
use crate::driver::Executor;
use crate::error::{Error, Result, ResultExt};
use crate::params;
use crate::store::ContextStore;
use crate::types::Context;

impl SqlDataStore {
    /// Overwrites one pointer column of the singleton row, creating the row
    /// first when a fresh schema lacks it.
    fn set_context_column(&self, column: &str, id: Option<i64>) -> Result<()> {
        let sql = format!(
            "UPDATE context SET {column} = ?1, updated_at = {} WHERE id = 1",
            self.now()
        );
        self.in_tx(|tx| {
            tx.execute(
                "INSERT INTO context (id) VALUES (1) ON CONFLICT (id) DO NOTHING",
                params![],
            )?;
            tx.execute(&sql, params![id])?;
            Ok(())
        })
        .context(|| format!("set {column}"))
    }
}

impl ContextStore for SqlDataStore {
    fn get_context(&self) -> Result<Context> {
        let sql = format!("SELECT {CONTEXT_COLUMNS} FROM context WHERE id = 1");
        match self.driver.query_row(&sql, params![]) {
            Ok(row) => rows::context(&row),
            Err(Error::NoRows) => Ok(Context::default()),
            Err(e) => Err(e.context("get context")),
        }
    }

    fn set_active_ecosystem(&self, id: Option<i64>) -> Result<()> {
        self.set_context_column("active_ecosystem_id", id)
    }

    fn set_active_domain(&self, id: Option<i64>) -> Result<()> {
        self.set_context_column("active_domain_id", id)
    }

    fn set_active_app(&self, id: Option<i64>) -> Result<()> {
        self.set_context_column("active_app_id", id)
    }

    fn set_active_workspace(&self, id: Option<i64>) -> Result<()> {
        self.set_context_column("active_workspace_id", id)
    }

    fn set_active_project(&self, id: Option<i64>) -> Result<()> {
        self.set_context_column("active_project_id", id)
    }
}
