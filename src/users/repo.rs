use std::sync::Arc;

use tracing::{error, instrument, warn};

use crate::db::{ConnectionFactory, DbError, DbResult, ProcedureCommand, ResultRow, SqlType};
use crate::error::{RepositoryError, RepositoryResult};
use crate::users::dto::{CreateUserDto, LoginUserDto, UpdateUserDto, UserResponseDto, UserRoleDto};

/// `spAddUser` reports this id when no user was created.
const NOT_CREATED: i32 = -1;

const ERROR_MESSAGE: &str = "ErrorMessage";
const USER_ID: &str = "UserID";

/// Output parameters the user procedures report through.
struct Outputs {
    user_id: Option<i32>,
    /// NULL and empty both mean "no error".
    error_message: Option<String>,
}

impl Outputs {
    fn into_result(self) -> RepositoryResult<()> {
        match self.error_message {
            Some(message) => Err(RepositoryError::Rejected(message)),
            None => Ok(()),
        }
    }
}

/// Stored-procedure backed user store. Every call takes its own connection.
pub struct UserRepository {
    connections: Arc<dyn ConnectionFactory>,
    audit_user: String,
}

impl UserRepository {
    pub fn new(connections: Arc<dyn ConnectionFactory>, audit_user: impl Into<String>) -> Self {
        Self {
            connections,
            audit_user: audit_user.into(),
        }
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn add_user(&self, user: &CreateUserDto) -> RepositoryResult<i32> {
        let command = ProcedureCommand::new("spAddUser")
            .input("Email", user.email.as_str())
            .input("PasswordHash", user.password.as_str())
            .input("CreatedBy", self.audit_user.as_str())
            .output(USER_ID, SqlType::Int)
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        let out = self.call(&command).await?;
        match out.user_id {
            Some(id) if id != NOT_CREATED => Ok(id),
            _ => Err(rejected(
                &command,
                out.error_message,
                "An unknown error occurred while creating the user.",
            )),
        }
    }

    #[instrument(skip(self, user_role), fields(user_id = user_role.user_id, role_id = user_role.role_id))]
    pub async fn assign_role(&self, user_role: &UserRoleDto) -> RepositoryResult<()> {
        let command = ProcedureCommand::new("spAssignUserRole")
            .input("UserID", user_role.user_id)
            .input("RoleID", user_role.role_id)
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        self.call(&command).await?.into_result()
    }

    /// `None` lists everyone; `Some(flag)` only users with that active flag.
    #[instrument(skip(self))]
    pub async fn list_users(&self, is_active: Option<bool>) -> RepositoryResult<Vec<UserResponseDto>> {
        let command = ProcedureCommand::new("spListAllUsers").nullable_input(
            "IsActive",
            SqlType::Bit,
            is_active,
        );

        self.read_users(&command).await
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: i32) -> RepositoryResult<Option<UserResponseDto>> {
        let command = ProcedureCommand::new("spGetUserByID")
            .input("UserID", user_id)
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        Ok(self.read_users(&command).await?.into_iter().next())
    }

    #[instrument(skip(self, user), fields(user_id = user.user_id))]
    pub async fn update_user(&self, user: &UpdateUserDto) -> RepositoryResult<()> {
        let command = ProcedureCommand::new("spUpdateUserInformation")
            .input("UserID", user.user_id)
            .input("Email", user.email.as_str())
            .input("Password", user.password.as_str())
            .input("ModifiedBy", self.audit_user.as_str())
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        self.call(&command).await?.into_result()
    }

    /// Soft delete: the user is deactivated, never removed.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i32) -> RepositoryResult<()> {
        self.set_active(user_id, false).await
    }

    #[instrument(skip(self, login), fields(email = %login.email))]
    pub async fn login_user(&self, login: &LoginUserDto) -> RepositoryResult<i32> {
        let command = ProcedureCommand::new("spLoginUser")
            .input("Email", login.email.as_str())
            .input("PasswordHash", login.password.as_str())
            .output(USER_ID, SqlType::Int)
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        let out = self.call(&command).await?;
        match out.user_id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(rejected(&command, out.error_message, "Login failed.")),
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_user_active(&self, user_id: i32, is_active: bool) -> RepositoryResult<()> {
        self.set_active(user_id, is_active).await
    }

    async fn set_active(&self, user_id: i32, is_active: bool) -> RepositoryResult<()> {
        let command = ProcedureCommand::new("spToggleUserActive")
            .input("UserID", user_id)
            .input("IsActive", is_active)
            .output(ERROR_MESSAGE, SqlType::NVarChar(255));

        self.call(&command).await?.into_result()
    }

    async fn call(&self, command: &ProcedureCommand) -> RepositoryResult<Outputs> {
        let result = async {
            let mut conn = self.connections.open().await?;
            let outputs = conn.execute_non_query(command).await?;
            Ok::<_, DbError>(Outputs {
                user_id: outputs.int(USER_ID)?,
                error_message: outputs.text(ERROR_MESSAGE)?.filter(|m| !m.is_empty()),
            })
        }
        .await;
        result.map_err(|e| infrastructure(command, e))
    }

    async fn read_users(&self, command: &ProcedureCommand) -> RepositoryResult<Vec<UserResponseDto>> {
        let result = async {
            let mut conn = self.connections.open().await?;
            let rows = conn.execute_reader(command).await?;
            rows.iter().map(user_from_row).collect::<DbResult<Vec<_>>>()
        }
        .await;
        result.map_err(|e| infrastructure(command, e))
    }
}

fn user_from_row(row: &ResultRow) -> DbResult<UserResponseDto> {
    Ok(UserResponseDto {
        user_id: row.get_i32("UserID")?,
        email: row.get_string("Email")?,
        is_active: row.get_bool("IsActive")?,
        role_id: row.get_i32("RoleID")?,
        last_login: row.get_optional_datetime("LastLogin")?,
    })
}

fn infrastructure(command: &ProcedureCommand, e: DbError) -> RepositoryError {
    error!(error = %e, procedure = command.name(), "stored procedure call failed");
    RepositoryError::Infrastructure(e)
}

fn rejected(command: &ProcedureCommand, message: Option<String>, default: &str) -> RepositoryError {
    let message = message.unwrap_or_else(|| default.to_owned());
    warn!(procedure = command.name(), %message, "procedure rejected request");
    RepositoryError::Rejected(message)
}
