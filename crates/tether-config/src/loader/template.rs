//! Starter schema template with inline documentation comments.

/// Generate the default schema TOML content with comments.
pub(crate) fn default_schema_toml() -> &'static str {
    r##"# Tether schema declaration
# Channel names may use any casing; each maps to a camelCase callable name
# ("user.get-data" -> userGetData). Descriptors are free-form documentation.

# Name under which the client surface is installed.
bridge_key = "api"

# Reject registrations and sends on channels not declared below.
strict = true

[calls]
"ping" = "() -> string"
# "get-user" = "(id: string) -> User"

[events]
# "user.updated" = "(user: User)"
"##
}
