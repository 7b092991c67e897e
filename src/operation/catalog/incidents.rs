//! AWS Systems Manager Incident Manager (`ssm-incidents`) catalog.

use super::{op, ServiceCatalog};
use crate::operation::{OperationDescriptor, ParamSpec};

/// Built-in catalog for SSM Incident Manager (`aws ssm-incidents`).
pub struct IncidentsCatalog;

const SERVICE: &str = "ssm-incidents";

const INCIDENTS_PAGE_MAX: u32 = 100;

/// `ListIncidentFindings` accepts at most 20 results per page.
const FINDINGS_PAGE_MAX: u32 = 20;

fn arn() -> ParamSpec {
    ParamSpec::string("Arn").required().position(0)
}

fn record_arn() -> ParamSpec {
    ParamSpec::string("IncidentRecordArn").required().position(0)
}

fn resource_arn() -> ParamSpec {
    ParamSpec::string("ResourceArn").required().position(0)
}

fn chat_channel() -> ParamSpec {
    ParamSpec::json("ChatChannel").describe("{\"empty\": {}} or {\"chatbotSns\": [...]}")
}

impl ServiceCatalog for IncidentsCatalog {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn noun_prefix(&self) -> &'static str {
        "SSMI"
    }

    fn operations(&self) -> Vec<OperationDescriptor> {
        vec![
            op(SERVICE, "BatchGetIncidentFindings", "Get-SSMIIncidentFindingBatch")
                .param(record_arn())
                .param(ParamSpec::list("FindingId").wire("findingIds").required())
                .returns("findings", &["findings", "errors"])
                .build(),
            op(SERVICE, "CreateReplicationSet", "New-SSMIReplicationSet")
                .param(
                    ParamSpec::json("RegionMap")
                        .wire("regions")
                        .required()
                        .describe("Map of region name to {\"sseKmsKeyId\": ...}"),
                )
                .param(ParamSpec::map("Tag").wire("tags"))
                .idempotent()
                .returns("arn", &["arn"])
                .synopsis("Creates the replication set that holds Incident Manager data")
                .build(),
            op(SERVICE, "CreateResponsePlan", "New-SSMIResponsePlan")
                .param(ParamSpec::string("Name").required().position(0))
                .param(ParamSpec::string("DisplayName"))
                .param(ParamSpec::json("IncidentTemplate").required())
                .param(chat_channel())
                .param(ParamSpec::list("Engagement").wire("engagements"))
                .param(ParamSpec::json("Action").wire("actions"))
                .param(ParamSpec::json("Integration").wire("integrations"))
                .param(ParamSpec::map("Tag").wire("tags"))
                .idempotent()
                .returns("arn", &["arn"])
                .build(),
            op(SERVICE, "CreateTimelineEvent", "New-SSMITimelineEvent")
                .param(record_arn())
                .param(ParamSpec::timestamp("EventTime").required())
                .param(ParamSpec::string("EventType").required())
                .param(ParamSpec::string("EventData").required())
                .param(ParamSpec::json("EventReference").wire("eventReferences"))
                .idempotent()
                .echo("IncidentRecordArn")
                .returns("*", &["incidentRecordArn", "eventId"])
                .build(),
            op(SERVICE, "DeleteIncidentRecord", "Remove-SSMIIncidentRecord")
                .param(arn())
                .echo("Arn")
                .build(),
            op(SERVICE, "DeleteReplicationSet", "Remove-SSMIReplicationSet")
                .param(arn())
                .echo("Arn")
                .build(),
            op(SERVICE, "DeleteResourcePolicy", "Remove-SSMIResourcePolicy")
                .param(resource_arn())
                .param(ParamSpec::string("PolicyId").required())
                .echo("ResourceArn")
                .build(),
            op(SERVICE, "DeleteResponsePlan", "Remove-SSMIResponsePlan")
                .param(arn())
                .echo("Arn")
                .build(),
            op(SERVICE, "DeleteTimelineEvent", "Remove-SSMITimelineEvent")
                .param(record_arn())
                .param(ParamSpec::string("EventId").required())
                .echo("EventId")
                .build(),
            op(SERVICE, "GetIncidentRecord", "Get-SSMIIncidentRecord")
                .param(arn())
                .returns("incidentRecord", &["incidentRecord"])
                .build(),
            op(SERVICE, "GetReplicationSet", "Get-SSMIReplicationSet")
                .param(arn())
                .returns("replicationSet", &["replicationSet"])
                .build(),
            op(SERVICE, "GetResourcePolicies", "Get-SSMIResourcePolicy")
                .param(resource_arn())
                .paginated("resourcePolicies")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("resourcePolicies", &["resourcePolicies", "nextToken"])
                .build(),
            op(SERVICE, "GetResponsePlan", "Get-SSMIResponsePlan")
                .param(arn())
                .returns(
                    "*",
                    &[
                        "arn",
                        "name",
                        "displayName",
                        "incidentTemplate",
                        "chatChannel",
                        "engagements",
                        "actions",
                        "integrations",
                    ],
                )
                .build(),
            op(SERVICE, "GetTimelineEvent", "Get-SSMITimelineEvent")
                .param(record_arn())
                .param(ParamSpec::string("EventId").required())
                .returns("event", &["event"])
                .build(),
            op(SERVICE, "ListIncidentFindings", "Get-SSMIIncidentFindingList")
                .param(record_arn())
                .paginated("findings")
                .service_max(FINDINGS_PAGE_MAX)
                .returns("findings", &["findings", "nextToken"])
                .build(),
            op(SERVICE, "ListIncidentRecords", "Get-SSMIIncidentRecordList")
                .param(ParamSpec::json("Filter").wire("filters").describe("List of {key, condition} filters"))
                .paginated("incidentRecordSummaries")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("incidentRecordSummaries", &["incidentRecordSummaries", "nextToken"])
                .synopsis("Lists incident records, newest first")
                .build(),
            op(SERVICE, "ListRelatedItems", "Get-SSMIRelatedItemList")
                .param(record_arn())
                .paginated("relatedItems")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("relatedItems", &["relatedItems", "nextToken"])
                .build(),
            op(SERVICE, "ListReplicationSets", "Get-SSMIReplicationSetList")
                .paginated("replicationSetArns")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("replicationSetArns", &["replicationSetArns", "nextToken"])
                .build(),
            op(SERVICE, "ListResponsePlans", "Get-SSMIResponsePlanList")
                .paginated("responsePlanSummaries")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("responsePlanSummaries", &["responsePlanSummaries", "nextToken"])
                .build(),
            op(SERVICE, "ListTagsForResource", "Get-SSMIResourceTag")
                .param(resource_arn())
                .returns("tags", &["tags"])
                .build(),
            op(SERVICE, "ListTimelineEvents", "Get-SSMITimelineEventList")
                .param(record_arn())
                .param(ParamSpec::json("Filter").wire("filters"))
                .param(ParamSpec::string("SortBy"))
                .param(ParamSpec::string("SortOrder").describe("ASCENDING or DESCENDING"))
                .paginated("eventSummaries")
                .service_max(INCIDENTS_PAGE_MAX)
                .returns("eventSummaries", &["eventSummaries", "nextToken"])
                .build(),
            op(SERVICE, "PutResourcePolicy", "Write-SSMIResourcePolicy")
                .param(resource_arn())
                .param(ParamSpec::string("Policy").required())
                .returns("policyId", &["policyId"])
                .build(),
            op(SERVICE, "StartIncident", "Start-SSMIIncident")
                .param(ParamSpec::string("ResponsePlanArn").required().position(0))
                .param(ParamSpec::string("Title"))
                .param(ParamSpec::integer("Impact").describe("1 (critical) through 5 (no impact)"))
                .param(ParamSpec::json("TriggerDetail").wire("triggerDetails"))
                .param(ParamSpec::json("RelatedItem").wire("relatedItems"))
                .idempotent()
                .echo("ResponsePlanArn")
                .returns("incidentRecordArn", &["incidentRecordArn"])
                .synopsis("Starts an incident from a response plan")
                .build(),
            op(SERVICE, "TagResource", "Add-SSMIResourceTag")
                .param(resource_arn())
                .param(ParamSpec::map("Tag").wire("tags").required())
                .echo("ResourceArn")
                .build(),
            op(SERVICE, "UntagResource", "Remove-SSMIResourceTag")
                .param(resource_arn())
                .param(ParamSpec::list("TagKey").wire("tagKeys").required())
                .echo("ResourceArn")
                .build(),
            op(SERVICE, "UpdateDeletionProtection", "Update-SSMIDeletionProtection")
                .param(arn())
                .param(ParamSpec::boolean("DeletionProtected").required())
                .idempotent()
                .echo("Arn")
                .build(),
            op(SERVICE, "UpdateIncidentRecord", "Update-SSMIIncidentRecord")
                .param(arn())
                .param(ParamSpec::string("Title"))
                .param(ParamSpec::string("Summary"))
                .param(ParamSpec::integer("Impact"))
                .param(ParamSpec::string("Status").describe("OPEN or RESOLVED"))
                .param(chat_channel())
                .param(ParamSpec::json("NotificationTarget").wire("notificationTargets"))
                .idempotent()
                .echo("Arn")
                .build(),
            op(SERVICE, "UpdateRelatedItems", "Update-SSMIRelatedItem")
                .param(record_arn())
                .param(ParamSpec::json("RelatedItemsUpdate").required())
                .idempotent()
                .echo("IncidentRecordArn")
                .build(),
            op(SERVICE, "UpdateReplicationSet", "Update-SSMIReplicationSet")
                .param(arn())
                .param(ParamSpec::json("Action").wire("actions").required())
                .idempotent()
                .echo("Arn")
                .build(),
            op(SERVICE, "UpdateResponsePlan", "Update-SSMIResponsePlan")
                .param(arn())
                .param(ParamSpec::string("DisplayName"))
                .param(ParamSpec::string("IncidentTemplateTitle"))
                .param(ParamSpec::integer("IncidentTemplateImpact"))
                .param(ParamSpec::string("IncidentTemplateSummary"))
                .param(ParamSpec::string("IncidentTemplateDedupeString"))
                .param(ParamSpec::json("IncidentTemplateNotificationTarget").wire("incidentTemplateNotificationTargets"))
                .param(ParamSpec::map("IncidentTemplateTag").wire("incidentTemplateTags"))
                .param(chat_channel())
                .param(ParamSpec::list("Engagement").wire("engagements"))
                .param(ParamSpec::json("Action").wire("actions"))
                .param(ParamSpec::json("Integration").wire("integrations"))
                .idempotent()
                .echo("Arn")
                .build(),
            op(SERVICE, "UpdateTimelineEvent", "Update-SSMITimelineEvent")
                .param(record_arn())
                .param(ParamSpec::string("EventId").required())
                .param(ParamSpec::timestamp("EventTime"))
                .param(ParamSpec::string("EventType"))
                .param(ParamSpec::string("EventData"))
                .param(ParamSpec::json("EventReference").wire("eventReferences"))
                .idempotent()
                .echo("EventId")
                .build(),
        ]
    }
}
