//! AWS Resource Access Manager (RAM) catalog.

use super::{op, ServiceCatalog};
use crate::operation::{OperationDescriptor, ParamSpec};

/// Built-in catalog for AWS RAM (`aws ram`).
pub struct RamCatalog;

const SERVICE: &str = "ram";

/// RAM rejects page sizes above this.
const RAM_PAGE_MAX: u32 = 500;

fn share_arn() -> ParamSpec {
    ParamSpec::string("ResourceShareArn").position(0)
}

fn permission_arn() -> ParamSpec {
    ParamSpec::string("PermissionArn").position(0)
}

fn resource_owner() -> ParamSpec {
    ParamSpec::string("ResourceOwner")
        .required()
        .describe("SELF or OTHER-ACCOUNTS")
}

fn region_scope() -> ParamSpec {
    ParamSpec::string("ResourceRegionScope").describe("ALL, REGIONAL or GLOBAL")
}

impl ServiceCatalog for RamCatalog {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn noun_prefix(&self) -> &'static str {
        "RAM"
    }

    fn operations(&self) -> Vec<OperationDescriptor> {
        vec![
            op(SERVICE, "AcceptResourceShareInvitation", "Confirm-RAMResourceShareInvitation")
                .param(
                    ParamSpec::string("ResourceShareInvitationArn")
                        .required()
                        .position(0),
                )
                .idempotent()
                .echo("ResourceShareInvitationArn")
                .returns("resourceShareInvitation", &["resourceShareInvitation", "clientToken"])
                .synopsis("Accepts an invitation to a resource share from another account")
                .build(),
            op(SERVICE, "AssociateResourceShare", "Connect-RAMResourceShare")
                .param(share_arn().required())
                .param(ParamSpec::list("ResourceArn").wire("resourceArns"))
                .param(ParamSpec::list("Principal").wire("principals"))
                .param(ParamSpec::list("Source").wire("sources"))
                .idempotent()
                .echo("ResourceShareArn")
                .returns("resourceShareAssociations", &["resourceShareAssociations", "clientToken"])
                .synopsis("Adds resources or principals to a resource share")
                .build(),
            op(SERVICE, "AssociateResourceSharePermission", "Connect-RAMResourceSharePermission")
                .param(share_arn().required())
                .param(ParamSpec::string("PermissionArn").required())
                .param(ParamSpec::boolean("Replace"))
                .param(ParamSpec::integer("PermissionVersion"))
                .idempotent()
                .echo("ResourceShareArn")
                .returns("returnValue", &["returnValue", "clientToken"])
                .build(),
            op(SERVICE, "CreatePermission", "New-RAMPermission")
                .param(ParamSpec::string("Name").required().position(0))
                .param(ParamSpec::string("ResourceType").required())
                .param(ParamSpec::string("PolicyTemplate").required())
                .param(ParamSpec::json("Tag").wire("tags").describe("List of {key, value} objects"))
                .idempotent()
                .returns("permission", &["permission", "clientToken"])
                .synopsis("Creates a customer managed permission")
                .build(),
            op(SERVICE, "CreatePermissionVersion", "New-RAMPermissionVersion")
                .param(permission_arn().required())
                .param(ParamSpec::string("PolicyTemplate").required())
                .idempotent()
                .echo("PermissionArn")
                .returns("permission", &["permission", "clientToken"])
                .build(),
            op(SERVICE, "CreateResourceShare", "New-RAMResourceShare")
                .param(ParamSpec::string("Name").required().position(0))
                .param(ParamSpec::list("ResourceArn").wire("resourceArns"))
                .param(ParamSpec::list("Principal").wire("principals"))
                .param(ParamSpec::json("Tag").wire("tags").describe("List of {key, value} objects"))
                .param(ParamSpec::boolean("AllowExternalPrincipal").wire("allowExternalPrincipals"))
                .param(ParamSpec::list("PermissionArn").wire("permissionArns"))
                .param(ParamSpec::list("Source").wire("sources"))
                .idempotent()
                .returns("resourceShare", &["resourceShare", "clientToken"])
                .synopsis("Creates a resource share")
                .build(),
            op(SERVICE, "DeletePermission", "Remove-RAMPermission")
                .param(permission_arn().required())
                .idempotent()
                .echo("PermissionArn")
                .returns("returnValue", &["returnValue", "clientToken", "permissionStatus"])
                .build(),
            op(SERVICE, "DeletePermissionVersion", "Remove-RAMPermissionVersion")
                .param(permission_arn().required())
                .param(ParamSpec::integer("PermissionVersion").required())
                .idempotent()
                .echo("PermissionArn")
                .returns("returnValue", &["returnValue", "clientToken", "permissionStatus"])
                .build(),
            op(SERVICE, "DeleteResourceShare", "Remove-RAMResourceShare")
                .param(share_arn().required())
                .idempotent()
                .echo("ResourceShareArn")
                .returns("returnValue", &["returnValue", "clientToken"])
                .synopsis("Deletes a resource share")
                .build(),
            op(SERVICE, "DisassociateResourceShare", "Disconnect-RAMResourceShare")
                .param(share_arn().required())
                .param(ParamSpec::list("ResourceArn").wire("resourceArns"))
                .param(ParamSpec::list("Principal").wire("principals"))
                .param(ParamSpec::list("Source").wire("sources"))
                .idempotent()
                .echo("ResourceShareArn")
                .returns("resourceShareAssociations", &["resourceShareAssociations", "clientToken"])
                .build(),
            op(SERVICE, "DisassociateResourceSharePermission", "Disconnect-RAMResourceSharePermission")
                .param(share_arn().required())
                .param(ParamSpec::string("PermissionArn").required())
                .idempotent()
                .echo("ResourceShareArn")
                .returns("returnValue", &["returnValue", "clientToken"])
                .build(),
            op(SERVICE, "EnableSharingWithAwsOrganization", "Enable-RAMSharingWithAwsOrganization")
                .returns("returnValue", &["returnValue"])
                .build(),
            op(SERVICE, "GetPermission", "Get-RAMPermission")
                .param(permission_arn().required())
                .param(ParamSpec::integer("PermissionVersion"))
                .returns("permission", &["permission"])
                .build(),
            op(SERVICE, "GetResourcePolicies", "Get-RAMResourcePolicy")
                .param(
                    ParamSpec::list("ResourceArn")
                        .wire("resourceArns")
                        .required()
                        .position(0),
                )
                .param(ParamSpec::string("Principal"))
                .paginated("policies")
                .service_max(RAM_PAGE_MAX)
                .returns("policies", &["policies", "nextToken"])
                .build(),
            op(SERVICE, "GetResourceShareAssociations", "Get-RAMResourceShareAssociation")
                .param(
                    ParamSpec::string("AssociationType")
                        .required()
                        .position(0)
                        .describe("PRINCIPAL or RESOURCE"),
                )
                .param(ParamSpec::list("ResourceShareArn").wire("resourceShareArns"))
                .param(ParamSpec::string("ResourceArn"))
                .param(ParamSpec::string("Principal"))
                .param(ParamSpec::string("AssociationStatus"))
                .paginated("resourceShareAssociations")
                .service_max(RAM_PAGE_MAX)
                .returns("resourceShareAssociations", &["resourceShareAssociations", "nextToken"])
                .build(),
            op(SERVICE, "GetResourceShareInvitations", "Get-RAMResourceShareInvitation")
                .param(
                    ParamSpec::list("ResourceShareInvitationArn")
                        .wire("resourceShareInvitationArns")
                        .position(0),
                )
                .param(ParamSpec::list("ResourceShareArn").wire("resourceShareArns"))
                .paginated("resourceShareInvitations")
                .service_max(RAM_PAGE_MAX)
                .returns("resourceShareInvitations", &["resourceShareInvitations", "nextToken"])
                .build(),
            op(SERVICE, "GetResourceShares", "Get-RAMResourceShare")
                .param(resource_owner().position(0))
                .param(ParamSpec::list("ResourceShareArn").wire("resourceShareArns"))
                .param(ParamSpec::string("ResourceShareStatus"))
                .param(ParamSpec::string("Name"))
                .param(ParamSpec::json("TagFilter").wire("tagFilters"))
                .param(ParamSpec::string("PermissionArn"))
                .param(ParamSpec::integer("PermissionVersion"))
                .paginated("resourceShares")
                .service_max(RAM_PAGE_MAX)
                .returns("resourceShares", &["resourceShares", "nextToken"])
                .synopsis("Lists resource shares owned by or shared with this account")
                .build(),
            op(SERVICE, "ListPendingInvitationResources", "Get-RAMPendingInvitationResourceList")
                .param(
                    ParamSpec::string("ResourceShareInvitationArn")
                        .required()
                        .position(0),
                )
                .param(region_scope())
                .paginated("resources")
                .service_max(RAM_PAGE_MAX)
                .returns("resources", &["resources", "nextToken"])
                .build(),
            op(SERVICE, "ListPermissionAssociations", "Get-RAMPermissionAssociation")
                .param(permission_arn())
                .param(ParamSpec::integer("PermissionVersion"))
                .param(ParamSpec::string("AssociationStatus"))
                .param(ParamSpec::string("ResourceType"))
                .param(ParamSpec::string("FeatureSet"))
                .param(ParamSpec::boolean("DefaultVersion"))
                .paginated("permissions")
                .service_max(RAM_PAGE_MAX)
                .returns("permissions", &["permissions", "nextToken"])
                .build(),
            op(SERVICE, "ListPermissionVersions", "Get-RAMPermissionVersion")
                .param(permission_arn().required())
                .paginated("permissions")
                .service_max(RAM_PAGE_MAX)
                .returns("permissions", &["permissions", "nextToken"])
                .build(),
            op(SERVICE, "ListPermissions", "Get-RAMPermissionList")
                .param(ParamSpec::string("ResourceType").position(0))
                .param(ParamSpec::string("PermissionType").describe("ALL, AWS_MANAGED or CUSTOMER_MANAGED"))
                .paginated("permissions")
                .service_max(RAM_PAGE_MAX)
                .returns("permissions", &["permissions", "nextToken"])
                .build(),
            op(SERVICE, "ListPrincipals", "Get-RAMPrincipalList")
                .param(resource_owner().position(0))
                .param(ParamSpec::string("ResourceArn"))
                .param(ParamSpec::list("Principal").wire("principals"))
                .param(ParamSpec::string("ResourceType"))
                .param(ParamSpec::list("ResourceShareArn").wire("resourceShareArns"))
                .paginated("principals")
                .service_max(RAM_PAGE_MAX)
                .returns("principals", &["principals", "nextToken"])
                .build(),
            op(SERVICE, "ListReplacePermissionAssociationsWork", "Get-RAMReplacePermissionAssociationsWork")
                .param(ParamSpec::list("WorkId").wire("workIds").position(0))
                .param(ParamSpec::string("Status"))
                .paginated("replacePermissionAssociationsWorks")
                .service_max(RAM_PAGE_MAX)
                .returns(
                    "replacePermissionAssociationsWorks",
                    &["replacePermissionAssociationsWorks", "nextToken"],
                )
                .build(),
            op(SERVICE, "ListResourceSharePermissions", "Get-RAMResourceSharePermissionList")
                .param(share_arn().required())
                .paginated("permissions")
                .service_max(RAM_PAGE_MAX)
                .returns("permissions", &["permissions", "nextToken"])
                .build(),
            op(SERVICE, "ListResourceTypes", "Get-RAMResourceType")
                .param(region_scope())
                .paginated("resourceTypes")
                .service_max(RAM_PAGE_MAX)
                .returns("resourceTypes", &["resourceTypes", "nextToken"])
                .build(),
            op(SERVICE, "ListResources", "Get-RAMResourceList")
                .param(resource_owner().position(0))
                .param(ParamSpec::string("Principal"))
                .param(ParamSpec::string("ResourceType"))
                .param(ParamSpec::list("ResourceArn").wire("resourceArns"))
                .param(ParamSpec::list("ResourceShareArn").wire("resourceShareArns"))
                .param(region_scope())
                .paginated("resources")
                .service_max(RAM_PAGE_MAX)
                .returns("resources", &["resources", "nextToken"])
                .build(),
            op(SERVICE, "PromotePermissionCreatedFromPolicy", "Convert-RAMPermissionCreatedFromPolicy")
                .param(permission_arn().required())
                .param(ParamSpec::string("Name").required())
                .idempotent()
                .echo("PermissionArn")
                .returns("permission", &["permission", "clientToken"])
                .build(),
            op(SERVICE, "PromoteResourceShareCreatedFromPolicy", "Convert-RAMResourceShareCreatedFromPolicy")
                .param(share_arn().required())
                .echo("ResourceShareArn")
                .returns("returnValue", &["returnValue"])
                .build(),
            op(SERVICE, "RejectResourceShareInvitation", "Deny-RAMResourceShareInvitation")
                .param(
                    ParamSpec::string("ResourceShareInvitationArn")
                        .required()
                        .position(0),
                )
                .idempotent()
                .echo("ResourceShareInvitationArn")
                .returns("resourceShareInvitation", &["resourceShareInvitation", "clientToken"])
                .build(),
            op(SERVICE, "ReplacePermissionAssociations", "Update-RAMPermissionAssociation")
                .param(ParamSpec::string("FromPermissionArn").required().position(0))
                .param(ParamSpec::integer("FromPermissionVersion"))
                .param(ParamSpec::string("ToPermissionArn").required())
                .idempotent()
                .echo("FromPermissionArn")
                .returns(
                    "replacePermissionAssociationsWork",
                    &["replacePermissionAssociationsWork", "clientToken"],
                )
                .build(),
            op(SERVICE, "SetDefaultPermissionVersion", "Set-RAMDefaultPermissionVersion")
                .param(permission_arn().required())
                .param(ParamSpec::integer("PermissionVersion").required())
                .idempotent()
                .echo("PermissionArn")
                .returns("returnValue", &["returnValue", "clientToken"])
                .build(),
            op(SERVICE, "TagResource", "Add-RAMResourceTag")
                .param(share_arn())
                .param(ParamSpec::string("ResourceArn"))
                .param(
                    ParamSpec::json("Tag")
                        .wire("tags")
                        .required()
                        .describe("List of {key, value} objects"),
                )
                .echo("ResourceShareArn")
                .build(),
            op(SERVICE, "UntagResource", "Remove-RAMResourceTag")
                .param(share_arn())
                .param(ParamSpec::string("ResourceArn"))
                .param(ParamSpec::list("TagKey").wire("tagKeys").required())
                .echo("ResourceShareArn")
                .build(),
            op(SERVICE, "UpdateResourceShare", "Update-RAMResourceShare")
                .param(share_arn().required())
                .param(ParamSpec::string("Name"))
                .param(ParamSpec::boolean("AllowExternalPrincipal").wire("allowExternalPrincipals"))
                .idempotent()
                .echo("ResourceShareArn")
                .returns("resourceShare", &["resourceShare", "clientToken"])
                .build(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Impact, ParamKind};

    fn find(command: &str) -> OperationDescriptor {
        RamCatalog
            .operations()
            .into_iter()
            .find(|d| d.command == command)
            .unwrap_or_else(|| panic!("{} not in catalog", command))
    }

    #[test]
    fn test_ram_operation_count() {
        assert_eq!(RamCatalog.operations().len(), 34);
    }

    #[test]
    fn test_get_resource_shares_shape() {
        let desc = find("Get-RAMResourceShare");
        assert_eq!(desc.operation, "GetResourceShares");
        assert_eq!(desc.impact(), Impact::None);
        assert_eq!(desc.default_selector, "resourceShares");
        let owner = desc.param("ResourceOwner").unwrap();
        assert!(owner.required);
        assert_eq!(owner.position, Some(0));
        let arns = desc.param("ResourceShareArn").unwrap();
        assert_eq!(arns.kind, ParamKind::StringList);
        assert_eq!(arns.wire_path(), "resourceShareArns");
        assert_eq!(desc.pagination.as_ref().unwrap().service_max, Some(500));
    }

    #[test]
    fn test_delete_resource_share_is_high_impact() {
        let desc = find("Remove-RAMResourceShare");
        assert_eq!(desc.impact(), Impact::High);
        assert_eq!(desc.echo_param.as_deref(), Some("ResourceShareArn"));
        assert!(desc.param("ClientToken").is_some());
    }

    #[test]
    fn test_create_resource_share_is_medium_and_idempotent() {
        let desc = find("New-RAMResourceShare");
        assert_eq!(desc.impact(), Impact::Medium);
        assert_eq!(desc.idempotency_param.as_deref(), Some("ClientToken"));
        assert!(desc.pagination.is_none());
    }

    #[test]
    fn test_tag_resource_selects_whole_response() {
        let desc = find("Add-RAMResourceTag");
        assert_eq!(desc.default_selector, "*");
        assert!(desc.param("Tag").unwrap().required);
    }
}
