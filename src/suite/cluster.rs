//! Control plane reachability, nodes, system pods and Karpenter

use super::{CrdCheck, PodCheck, Recorder, SmokeSuite};
use crate::checks;
use crate::k8s::{resources, ClusterApi};
use crate::models::ResourceQuery;
use crate::probe::EndpointProbe;

const SYSTEM_PODS: [PodCheck; 3] = [
    PodCheck::required("kube-system", "k8s-app=kube-dns", "CoreDNS"),
    PodCheck::required("kube-system", "k8s-app=kube-proxy", "kube-proxy"),
    PodCheck::required("kube-system", "k8s-app=aws-node", "AWS VPC CNI"),
];

const KARPENTER_CONTROLLER: PodCheck = PodCheck::required(
    "kube-system",
    "app.kubernetes.io/name=karpenter",
    "Karpenter controller",
);

const KARPENTER_CRDS: [CrdCheck; 2] = [
    CrdCheck {
        crd: "nodepools.karpenter.sh",
        display: "NodePool CRD",
    },
    CrdCheck {
        crd: "ec2nodeclasses.karpenter.k8s.aws",
        display: "EC2NodeClass CRD",
    },
];

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_cluster(&self, out: &mut Recorder<'_>) {
        out.section("Cluster Connectivity");
        out.record(checks::api_reachable(self.cluster.server_version().await));

        out.section("Node Health");
        out.extend(checks::node_readiness(self.cluster.list_nodes().await));

        out.section("System Pods");
        for check in &SYSTEM_PODS {
            self.check_pods(out, check).await;
        }

        out.section("Karpenter");
        self.check_pods(out, &KARPENTER_CONTROLLER).await;
        for check in &KARPENTER_CRDS {
            self.check_crd(out, check).await;
        }

        let pools = self
            .cluster
            .list_custom(&resources::NODE_POOLS, &ResourceQuery::all())
            .await
            .map(|pools| pools.len());
        out.record(checks::presence("NodePools configured", pools));
    }
}
