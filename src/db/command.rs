use time::PrimitiveDateTime;

/// Database-side type of a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    Bit,
    NVarChar(usize),
    DateTime,
}

impl SqlType {
    /// Postgres type used when a typed NULL has to be spelled out in SQL.
    pub fn pg_name(self) -> String {
        match self {
            SqlType::Int => "int4".into(),
            SqlType::Bit => "boolean".into(),
            SqlType::NVarChar(len) => format!("varchar({len})"),
            SqlType::DateTime => "timestamp".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i32),
    Bool(bool),
    Text(String),
    DateTime(PrimitiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    fn inferred_type(&self) -> SqlType {
        match self {
            SqlValue::Int(_) => SqlType::Int,
            SqlValue::Bool(_) => SqlType::Bit,
            SqlValue::DateTime(_) => SqlType::DateTime,
            SqlValue::Text(_) | SqlValue::Null => SqlType::NVarChar(4000),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<PrimitiveDateTime> for SqlValue {
    fn from(v: PrimitiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub direction: Direction,
    pub value: SqlValue,
}

/// A named stored-procedure invocation with its parameters in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCommand {
    name: &'static str,
    parameters: Vec<SqlParameter>,
}

impl ProcedureCommand {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parameters: Vec::new(),
        }
    }

    pub fn input(mut self, name: &'static str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        self.parameters.push(SqlParameter {
            name,
            sql_type: value.inferred_type(),
            direction: Direction::Input,
            value,
        });
        self
    }

    /// Input whose `None` is sent as a database NULL of `sql_type`.
    pub fn nullable_input<V: Into<SqlValue>>(
        mut self,
        name: &'static str,
        sql_type: SqlType,
        value: Option<V>,
    ) -> Self {
        self.parameters.push(SqlParameter {
            name,
            sql_type,
            direction: Direction::Input,
            value: value.map(Into::into).unwrap_or(SqlValue::Null),
        });
        self
    }

    pub fn output(mut self, name: &'static str, sql_type: SqlType) -> Self {
        self.parameters.push(SqlParameter {
            name,
            sql_type,
            direction: Direction::Output,
            value: SqlValue::Null,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }

    pub fn inputs(&self) -> impl Iterator<Item = &SqlParameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction == Direction::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &SqlParameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction == Direction::Output)
    }

    /// Value bound to an input parameter, matched case-insensitively.
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.inputs()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_keep_declaration_order_and_direction() {
        let cmd = ProcedureCommand::new("spAddUser")
            .input("Email", "a@b.c")
            .input("PasswordHash", "secret")
            .output("UserID", SqlType::Int)
            .output("ErrorMessage", SqlType::NVarChar(255));

        let names: Vec<_> = cmd.parameters().iter().map(|p| p.name).collect();
        assert_eq!(names, ["Email", "PasswordHash", "UserID", "ErrorMessage"]);
        assert_eq!(cmd.inputs().count(), 2);
        assert_eq!(cmd.outputs().count(), 2);
        assert!(cmd.outputs().all(|p| p.value.is_null()));
    }

    #[test]
    fn nullable_input_none_becomes_typed_null() {
        let cmd = ProcedureCommand::new("spListAllUsers").nullable_input(
            "IsActive",
            SqlType::Bit,
            None::<bool>,
        );
        let param = &cmd.parameters()[0];
        assert_eq!(param.sql_type, SqlType::Bit);
        assert_eq!(param.value, SqlValue::Null);
        assert_eq!(cmd.value("isactive"), Some(&SqlValue::Null));
    }

    #[test]
    fn input_type_is_inferred_from_value() {
        let cmd = ProcedureCommand::new("spToggleUserActive")
            .input("UserID", 3)
            .input("IsActive", false);
        assert_eq!(cmd.parameters()[0].sql_type, SqlType::Int);
        assert_eq!(cmd.parameters()[1].sql_type, SqlType::Bit);
        assert_eq!(cmd.value("UserID"), Some(&SqlValue::Int(3)));
        assert_eq!(cmd.value("Missing"), None);
    }
}
