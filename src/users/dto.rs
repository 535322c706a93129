use serde::{de, Deserialize, Deserializer, Serialize};
use time::PrimitiveDateTime;

use crate::error::RepositoryError;

// Property names go over the wire verbatim, so every record pins its casing.

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUserDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUserResponseDto {
    pub user_id: i32,
    pub is_created: bool,
    pub message: String,
}

impl From<Result<i32, RepositoryError>> for CreateUserResponseDto {
    fn from(result: Result<i32, RepositoryError>) -> Self {
        match result {
            Ok(user_id) => Self {
                user_id,
                is_created: true,
                message: "User Created Successfully".into(),
            },
            Err(e) => Self {
                user_id: 0,
                is_created: false,
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleDto {
    #[serde(rename = "UserID")]
    pub user_id: i32,
    #[serde(rename = "RoleID")]
    pub role_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRoleResponseDto {
    pub is_assigned: bool,
    pub message: String,
}

impl From<Result<(), RepositoryError>> for UserRoleResponseDto {
    fn from(result: Result<(), RepositoryError>) -> Self {
        match result {
            Ok(()) => Self {
                is_assigned: true,
                message: "User Role Assigned".into(),
            },
            Err(e) => Self {
                is_assigned: false,
                message: e.to_string(),
            },
        }
    }
}

/// A user as listed by the procedures. No credentials are ever returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponseDto {
    #[serde(rename = "UserID")]
    pub user_id: i32,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "IsActive")]
    pub is_active: bool,
    #[serde(rename = "RoleID")]
    pub role_id: i32,
    #[serde(rename = "LastLogin", with = "last_login_format")]
    pub last_login: Option<PrimitiveDateTime>,
}

mod last_login_format {
    use serde::Serializer;
    use time::{macros::format_description, PrimitiveDateTime};

    pub fn serialize<S: Serializer>(
        value: &Option<PrimitiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => {
                let text = v
                    .format(format_description!(
                        "[year]-[month]-[day]T[hour]:[minute]:[second]"
                    ))
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserDto {
    #[serde(rename = "UserID")]
    pub user_id: i32,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Password")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserResponseDto {
    pub user_id: i32,
    pub is_updated: bool,
    pub message: String,
}

impl UpdateUserResponseDto {
    /// The requested id is echoed whether or not the update went through.
    pub fn new(user_id: i32, result: Result<(), RepositoryError>) -> Self {
        match result {
            Ok(()) => Self {
                user_id,
                is_updated: true,
                message: "User Information Updated.".into(),
            },
            Err(e) => Self {
                user_id,
                is_updated: false,
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteUserResponseDto {
    pub is_deleted: bool,
    pub message: String,
}

impl From<Result<(), RepositoryError>> for DeleteUserResponseDto {
    fn from(result: Result<(), RepositoryError>) -> Self {
        match result {
            Ok(()) => Self {
                is_deleted: true,
                message: "User Deleted.".into(),
            },
            Err(e) => Self {
                is_deleted: false,
                message: e.to_string(),
            },
        }
    }
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginUserDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginUserResponseDto {
    pub user_id: i32,
    pub is_login: bool,
    pub message: String,
}

impl From<Result<i32, RepositoryError>> for LoginUserResponseDto {
    fn from(result: Result<i32, RepositoryError>) -> Self {
        match result {
            Ok(user_id) => Self {
                user_id,
                is_login: true,
                message: "Login Successful".into(),
            },
            Err(e) => Self {
                user_id: 0,
                is_login: false,
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ToggleUserActiveResponseDto {
    pub success: bool,
    pub message: String,
}

impl From<Result<(), RepositoryError>> for ToggleUserActiveResponseDto {
    fn from(result: Result<(), RepositoryError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                message: "Operation completed successfully.".into(),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(rename = "isActive", default, deserialize_with = "optional_flag")]
    pub is_active: Option<bool>,
}

/// `?isActive=` with no value means no filter, same as leaving it out.
fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(v) => Err(de::Error::invalid_value(
            de::Unexpected::Str(v),
            &"true or false",
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleActiveQuery {
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn response_properties_keep_their_casing() {
        let created: Result<i32, RepositoryError> = Ok(5);
        let json = serde_json::to_value(CreateUserResponseDto::from(created)).unwrap();
        assert_eq!(json["UserId"], 5);
        assert_eq!(json["IsCreated"], true);
        assert_eq!(json["Message"], "User Created Successfully");

        let user = UserResponseDto {
            user_id: 1,
            email: "guest@hotel.test".into(),
            is_active: true,
            role_id: 2,
            last_login: Some(datetime!(2024-05-06 07:08:09)),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["UserID"], 1);
        assert_eq!(json["RoleID"], 2);
        assert_eq!(json["IsActive"], true);
        assert_eq!(json["LastLogin"], "2024-05-06T07:08:09");
    }

    #[test]
    fn missing_last_login_serializes_as_null() {
        let user = UserResponseDto {
            user_id: 1,
            email: "guest@hotel.test".into(),
            is_active: false,
            role_id: 2,
            last_login: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json["LastLogin"].is_null());
    }

    #[test]
    fn request_bodies_read_pascal_case() {
        let role: UserRoleDto = serde_json::from_str(r#"{"UserID":3,"RoleID":1}"#).unwrap();
        assert_eq!((role.user_id, role.role_id), (3, 1));

        let login: LoginUserDto =
            serde_json::from_str(r#"{"Email":"a@b.c","Password":"pw"}"#).unwrap();
        assert_eq!(login.email, "a@b.c");
        assert_eq!(login.password, "pw");
    }

    #[test]
    fn blank_active_filter_means_no_filter() {
        let query: ListUsersQuery = serde_json::from_str(r#"{"isActive":""}"#).unwrap();
        assert_eq!(query.is_active, None);
        let query: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.is_active, None);
        let query: ListUsersQuery = serde_json::from_str(r#"{"isActive":"True"}"#).unwrap();
        assert_eq!(query.is_active, Some(true));
        assert!(serde_json::from_str::<ListUsersQuery>(r#"{"isActive":"maybe"}"#).is_err());
    }

    #[test]
    fn rejection_message_is_passed_through_verbatim() {
        let rejected: Result<(), RepositoryError> =
            Err(RepositoryError::Rejected("User not found.".into()));
        let dto = DeleteUserResponseDto::from(rejected);
        assert!(!dto.is_deleted);
        assert_eq!(dto.message, "User not found.");

        let dto = UpdateUserResponseDto::new(
            9,
            Err(RepositoryError::Rejected("Email already in use.".into())),
        );
        assert_eq!(dto.user_id, 9);
        assert!(!dto.is_updated);
        assert_eq!(dto.message, "Email already in use.");
    }
}
